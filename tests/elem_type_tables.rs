use mesh_geom::mesh_error::MeshGeomError;
use mesh_geom::topology::elem::{Elem, SideMode, SubElem};
use mesh_geom::topology::elem_type::{ElemType, NodeRole, Order};

#[test]
fn counts_match_the_element_catalogue() {
    let expected = [
        // (type, dim, nodes, sides, edges, children)
        (ElemType::NodeElem, 0, 1, 0, 0, 0),
        (ElemType::Edge2, 1, 2, 2, 0, 2),
        (ElemType::Edge3, 1, 3, 2, 0, 2),
        (ElemType::InfEdge2, 1, 2, 1, 0, 0),
        (ElemType::Quad4, 2, 4, 4, 4, 4),
        (ElemType::Quad9, 2, 9, 4, 4, 4),
        (ElemType::InfQuad4, 2, 4, 3, 3, 2),
        (ElemType::Hex8, 3, 8, 6, 12, 8),
        (ElemType::Hex27, 3, 27, 6, 12, 8),
        (ElemType::InfHex8, 3, 8, 5, 8, 4),
    ];
    for (t, dim, nodes, sides, edges, children) in expected {
        assert_eq!(t.dim(), dim, "{t} dim");
        assert_eq!(t.n_nodes(), nodes, "{t} nodes");
        assert_eq!(t.n_sides(), sides, "{t} sides");
        assert_eq!(t.n_edges(), edges, "{t} edges");
        assert_eq!(t.n_children(), children, "{t} children");
    }
}

#[test]
fn every_side_and_edge_node_is_in_range() {
    for t in ElemType::ALL {
        for s in 0..t.n_sides() {
            let nodes = t.side_nodes(s).unwrap();
            let side = t.side_type(s).unwrap();
            assert_eq!(nodes.len(), side.n_nodes(), "{t} side {s}");
            assert!(nodes.iter().all(|&n| n < t.n_nodes()));
            for &n in nodes {
                assert!(t.is_node_on_side(n, s).unwrap());
            }
        }
        for e in 0..t.n_edges() {
            let nodes = t.edge_nodes(e).unwrap();
            assert_eq!(nodes.len(), t.edge_type(e).unwrap().n_nodes(), "{t} edge {e}");
            assert!(nodes.iter().all(|&n| n < t.n_nodes()));
        }
    }
}

#[test]
fn node_roles_of_second_order_types() {
    assert_eq!(ElemType::Hex27.node_role(7).unwrap(), NodeRole::Vertex);
    assert_eq!(ElemType::Hex27.node_role(19).unwrap(), NodeRole::Edge);
    assert_eq!(ElemType::Hex27.node_role(22).unwrap(), NodeRole::Face);
    assert_eq!(ElemType::Hex27.node_role(26).unwrap(), NodeRole::Interior);
    assert_eq!(ElemType::Quad9.node_role(8).unwrap(), NodeRole::Face);
    assert!(ElemType::Edge3.is_edge(2).unwrap());
    // outer nodes of infinite elements are edge nodes
    assert!(ElemType::InfHex8.is_edge(5).unwrap());
    assert!(ElemType::InfQuad4.is_vertex(1).unwrap());
    assert!(!ElemType::InfQuad4.is_vertex(2).unwrap());
}

#[test]
fn out_of_range_queries_are_errors() {
    assert_eq!(
        ElemType::Quad4.node_role(4),
        Err(MeshGeomError::InvalidNodeIndex {
            elem_type: ElemType::Quad4,
            index: 4,
            n_nodes: 4
        })
    );
    assert_eq!(
        ElemType::Hex8.side_nodes(6),
        Err(MeshGeomError::InvalidSideIndex {
            elem_type: ElemType::Hex8,
            index: 6,
            n_sides: 6
        })
    );
    assert!(matches!(
        ElemType::InfHex8.edge_type(8),
        Err(MeshGeomError::InvalidEdgeIndex { .. })
    ));
    assert!(matches!(
        ElemType::Quad4.n_shape_functions(Order::Second),
        Err(MeshGeomError::UnsupportedOrder { .. })
    ));
}

#[test]
fn infinite_sides_alternate_between_base_and_lateral() {
    assert_eq!(ElemType::InfHex8.side_type(0).unwrap(), ElemType::Quad4);
    for s in 1..5 {
        assert_eq!(ElemType::InfHex8.side_type(s).unwrap(), ElemType::InfQuad4);
    }
    assert_eq!(ElemType::InfQuad4.side_type(0).unwrap(), ElemType::Edge2);
    assert_eq!(ElemType::InfQuad4.side_type(2).unwrap(), ElemType::InfEdge2);
    assert_eq!(ElemType::InfHex8.edge_type(3).unwrap(), ElemType::Edge2);
    assert_eq!(ElemType::InfHex8.edge_type(4).unwrap(), ElemType::InfEdge2);
}

#[test]
fn proxy_and_detached_sides_agree() {
    let nodes: Vec<usize> = (100..127).collect();
    let hex = Elem::new(ElemType::Hex27, nodes).unwrap();
    for s in 0..hex.n_sides() {
        let proxy = hex.build_side(s, SideMode::Proxy).unwrap();
        let detached = hex.build_side(s, SideMode::Detached).unwrap();
        assert!(matches!(proxy, SubElem::Borrowed(_)));
        assert!(detached.is_owned());
        assert_eq!(proxy.elem_type(), ElemType::Quad9);
        assert_eq!(proxy.node_ids(), detached.node_ids());
    }
    let edge = hex.build_edge(11).unwrap();
    assert_eq!(edge.elem_type(), ElemType::Edge3);
    assert_eq!(edge.nodes().collect::<Vec<_>>(), vec![104, 107, 119]);
    assert!(hex.build_side(6, SideMode::Proxy).is_err());
}

#[test]
fn names_round_trip_through_from_str() {
    for t in ElemType::ALL {
        let parsed: ElemType = t.to_string().parse().unwrap();
        assert_eq!(parsed, t);
    }
}
