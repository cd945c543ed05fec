//! `transitmap` — schematic octilinear transit maps from geographic
//! transit network data.
//!
//! Pipeline: read a GeoJSON transit graph, octilinearize it onto the grid,
//! optimize the per-edge line ordering, and write the schematic graph back
//! out as GeoJSON.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use tm_core::{Point, Polygon};
use tm_grid::{GridKind, Penalties};
use tm_octi::{LayoutConfig, Octilinearizer};
use tm_order::{LineOrderOptimizer, OptMode, OrderPenalties};
use tm_transit::TransitGraph;

// ── Flags ─────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "transitmap")]
#[command(about = "Schematic octilinear transit maps from geographic transit data")]
struct Cmd {
    /// Input GeoJSON transit graph ("-" for stdin).
    input: String,

    /// Output file (stdout if omitted).
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Grid cell size in input units.
    #[arg(long, default_value_t = 100.0)]
    grid_size: f64,

    /// Padding around the input bounding box before gridding.
    #[arg(long, default_value_t = 0.0)]
    border_rad: f64,

    /// Output format.
    #[arg(long, value_enum, default_value_t = PrintMode::Geojson)]
    print_mode: PrintMode,

    /// Pretty-print the GeoJSON output.
    #[arg(long)]
    pretty: bool,

    /// Line-ordering strategy.
    #[arg(long, default_value = "comb")]
    optim: String,

    /// Preferred ILP solver (gurobi | coin | glpk).
    #[arg(long)]
    ilp_solver: Option<String>,

    /// ILP time limit in seconds.
    #[arg(long)]
    ilp_time_limit: Option<u64>,

    /// Directory for cached ILP solutions.
    #[arg(long)]
    ilp_cache_dir: Option<PathBuf>,

    /// GeoJSON file with obstacle polygons the layout must avoid.
    #[arg(long)]
    obstacles: Option<PathBuf>,

    /// Maximum node displacement in grid cells.
    #[arg(long, default_value_t = 3.0)]
    max_grid_dist: f64,

    /// Stop routing after this many generations.
    #[arg(long)]
    abort_after: Option<usize>,

    /// Hanan-grid densification rounds (unsupported on the regular grid).
    #[arg(long, default_value_t = 0)]
    hanan_iters: usize,

    /// Print a run summary to stderr.
    #[arg(long)]
    stats: bool,

    /// Base-graph variant.
    #[arg(long, value_enum, default_value_t = BaseGraph::Octilinear)]
    base_graph: BaseGraph,

    /// Rotations (degrees) to try; the cheapest layout wins.
    #[arg(long, value_delimiter = ',')]
    rotations: Vec<f64>,

    // ── Penalty weights ───────────────────────────────────────────────────
    /// Penalty of a 45° bend.
    #[arg(long, default_value_t = 1.0)]
    pen_bend_45: f64,

    /// Penalty of a 90° bend.
    #[arg(long, default_value_t = 1.5)]
    pen_bend_90: f64,

    /// Penalty of a 135° bend.
    #[arg(long, default_value_t = 2.0)]
    pen_bend_135: f64,

    /// Movement penalty per displaced grid cell.
    #[arg(long, default_value_t = 10.0)]
    pen_move: f64,

    /// Same-segment crossing penalty.
    #[arg(long, default_value_t = 4.0)]
    pen_cross_same: f64,

    /// Different-segment crossing penalty.
    #[arg(long, default_value_t = 1.0)]
    pen_cross_diff: f64,

    /// Line splitting penalty.
    #[arg(long, default_value_t = 3.0)]
    pen_split: f64,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PrintMode {
    Geojson,
    None,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum BaseGraph {
    Octilinear,
    Orthogonal,
}

impl From<BaseGraph> for GridKind {
    fn from(b: BaseGraph) -> GridKind {
        match b {
            BaseGraph::Octilinear => GridKind::Octilinear,
            BaseGraph::Orthogonal => GridKind::Orthogonal,
        }
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));
    let cmd = Cmd::parse();

    let input = read_input(&cmd.input)?;
    log::info!(
        "input: {} nodes, {} edges, {} lines",
        input.node_count(),
        input.edge_count(),
        input.lines().len()
    );

    let layout_cfg = LayoutConfig {
        cell_size: cmd.grid_size,
        border_rad: cmd.border_rad,
        base_graph: cmd.base_graph.into(),
        pens: Penalties {
            p_45: cmd.pen_bend_45,
            p_90: cmd.pen_bend_90,
            p_135: cmd.pen_bend_135,
            move_pen_per_grid: cmd.pen_move,
            ..Penalties::default()
        },
        max_grid_dist: cmd.max_grid_dist,
        abort_after: cmd.abort_after,
        hanan_iters: cmd.hanan_iters,
        rotations: cmd.rotations.clone(),
        obstacles: match &cmd.obstacles {
            Some(path) => read_obstacles(path)?,
            None => Vec::new(),
        },
    };

    let t_layout = Instant::now();
    let drawing = Octilinearizer::new(layout_cfg)
        .draw(&input)
        .context("layout failed")?;
    let layout_ms = t_layout.elapsed().as_millis();

    let mode: OptMode = cmd
        .optim
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let mut optimizer = LineOrderOptimizer::new(mode);
    optimizer.pens = OrderPenalties {
        same_seg: cmd.pen_cross_same,
        diff_seg: cmd.pen_cross_diff,
        split: cmd.pen_split,
    };
    optimizer.solver_wish = cmd.ilp_solver.clone();
    optimizer.time_limit = cmd.ilp_time_limit.map(Duration::from_secs);
    optimizer.cache_dir = cmd.ilp_cache_dir.clone();

    let t_order = Instant::now();
    let (order, opt_report) = optimizer.optimize(&drawing.graph);
    let order_ms = t_order.elapsed().as_millis();

    match cmd.print_mode {
        PrintMode::Geojson => match &cmd.out {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("cannot create {}", path.display()))?;
                tm_output::write_geojson(BufWriter::new(file), &drawing.graph, Some(&order), cmd.pretty)?;
            }
            None => {
                tm_output::write_geojson(io::stdout().lock(), &drawing.graph, Some(&order), cmd.pretty)?;
            }
        },
        PrintMode::None => {}
    }

    if drawing.report.unrouted > 0 {
        log::warn!(
            "{} of {} combination edges could not be routed and were dropped",
            drawing.report.unrouted,
            drawing.report.unrouted + drawing.report.routed
        );
    }
    if opt_report.ilp_fallbacks > 0 {
        log::warn!(
            "{} component(s) kept their input line ordering (no usable ILP solver)",
            opt_report.ilp_fallbacks
        );
    }

    if cmd.stats {
        eprintln!("── layout ───────────────────────────────");
        eprintln!("  rotation        {:>8}°", drawing.report.rotation_deg);
        eprintln!("  collapsed edges {:>8}", drawing.report.collapsed_edges);
        eprintln!("  routed          {:>8}", drawing.report.routed);
        eprintln!("  unrouted        {:>8}", drawing.report.unrouted);
        eprintln!("  aborted         {:>8}", drawing.report.aborted);
        eprintln!("  total cost      {:>10.1}", drawing.report.total_cost);
        eprintln!("  time            {layout_ms:>6} ms");
        eprintln!("── line ordering ────────────────────────");
        eprintln!("  components      {:>8}", opt_report.components);
        eprintln!("  ILP components  {:>8}", opt_report.ilp_components);
        eprintln!("  ILP fallbacks   {:>8}", opt_report.ilp_fallbacks);
        eprintln!(
            "  score           {:>10.1} → {:.1}",
            opt_report.score_before, opt_report.score_after
        );
        eprintln!("  time            {order_ms:>6} ms");
    }

    Ok(())
}

fn read_input(arg: &str) -> Result<TransitGraph> {
    if arg == "-" {
        tm_output::read_geojson(io::stdin().lock()).context("cannot parse stdin")
    } else {
        let file = File::open(arg).with_context(|| format!("cannot open {arg}"))?;
        tm_output::read_geojson(BufReader::new(file)).with_context(|| format!("cannot parse {arg}"))
    }
}

/// Load obstacle polygons (outer rings) from a GeoJSON file.
fn read_obstacles(path: &PathBuf) -> Result<Vec<Polygon>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let fc: geojson::FeatureCollection =
        serde_json::from_reader(BufReader::new(file)).context("cannot parse obstacle GeoJSON")?;

    let mut out = Vec::new();
    for feature in &fc.features {
        if let Some(geojson::Geometry { value: geojson::Value::Polygon(rings), .. }) =
            &feature.geometry
        {
            if let Some(outer) = rings.first() {
                let pts: Vec<Point> = outer
                    .iter()
                    .filter(|c| c.len() >= 2)
                    .map(|c| Point::new(c[0], c[1]))
                    .collect();
                if pts.len() >= 3 {
                    out.push(Polygon::new(pts));
                }
            }
        }
    }
    log::info!("loaded {} obstacle polygon(s)", out.len());
    Ok(out)
}
