//! The `grid2grid` command: compare a coarse and a fine solution.
//!
//! ```text
//! grid2grid ivar coarse.msh fine.msh coarse_soln.msh fine_soln.msh
//! ```
//!
//! Prints both mesh summaries, the octree and lookup statistics and
//! `Computed error=<l2>` for variable `ivar`, then writes the per-node
//! difference field to `diff.plt`.

use crate::algs::field_transfer::{grid_to_grid_with_mapping, TransferReport};
use crate::context::Context;
use crate::io;
use crate::mesh_error::MeshGeomError;
use std::path::PathBuf;

pub const USAGE: &str = "grid2grid ivar coarse.msh fine.msh coarse_soln.msh fine_soln.msh";

/// Default output file for the difference field.
pub const DIFF_FILE: &str = "diff.plt";

#[derive(Clone, Debug, PartialEq)]
pub struct Grid2GridArgs {
    pub variable_index: usize,
    pub coarse_mesh: PathBuf,
    pub fine_mesh: PathBuf,
    pub coarse_solution: PathBuf,
    pub fine_solution: PathBuf,
    pub output: PathBuf,
}

impl Grid2GridArgs {
    /// Parse the arguments following the program name. Extra trailing
    /// arguments are ignored.
    pub fn parse<I, S>(args: I) -> Result<Self, MeshGeomError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let [ivar, coarse, fine, coarse_soln, fine_soln, ..] = args.as_slice() else {
            return Err(MeshGeomError::Usage(USAGE.to_string()));
        };
        let variable_index = ivar.parse::<usize>().map_err(|_| {
            MeshGeomError::Usage(format!("ivar must be a variable index, got {ivar:?}\n{USAGE}"))
        })?;
        Ok(Self {
            variable_index,
            coarse_mesh: coarse.into(),
            fine_mesh: fine.into(),
            coarse_solution: coarse_soln.into(),
            fine_solution: fine_soln.into(),
            output: DIFF_FILE.into(),
        })
    }
}

/// Run one comparison with a default [`Context`].
pub fn run(args: &Grid2GridArgs) -> Result<TransferReport, MeshGeomError> {
    run_with_context(args, Context::init())
}

/// Run one comparison with the tolerance and mapping of `ctx`.
pub fn run_with_context(args: &Grid2GridArgs, ctx: Context) -> Result<TransferReport, MeshGeomError> {

    let coarse_mesh = io::read_mesh(&args.coarse_mesh)?;
    println!("{coarse_mesh}");
    let fine_mesh = io::read_mesh(&args.fine_mesh)?;
    println!("{fine_mesh}");

    let coarse_field = io::read_field(&args.coarse_solution, &coarse_mesh)?;
    let fine_field = io::read_field(&args.fine_solution, &fine_mesh)?;

    let options = ctx.transfer_options(args.variable_index);
    let report = grid_to_grid_with_mapping(
        &coarse_mesh,
        &coarse_field,
        &fine_mesh,
        &fine_field,
        &options,
        *ctx.mapping(),
    )?;

    println!("n_active_bins() = {}", report.n_active_bins);
    println!(
        "octree lookups = {}, cache hits = {}",
        report.octree_lookups, report.cache_hits
    );
    println!("Computed error={}", report.l2_error);

    io::write_nodal_field(&args.output, &fine_mesh, &report.difference)?;
    ctx.close();
    Ok(report)
}
