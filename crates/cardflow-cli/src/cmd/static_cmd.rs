//! `cardflow static`: current card distribution across lists.

use std::path::PathBuf;

use anyhow::Context as _;
use cardflow_core::pipeline::collect_items;
use cardflow_core::snapshot::{Snapshot, SnapshotRow, count_by_bucket};
use clap::Args;
use serde::Serialize;

use super::{Context, split_list, today};
use crate::chart::{ChartRenderer, SvgChartRenderer, default_snapshot_path, snapshot_title};
use crate::output::{pretty_kv, render};

#[derive(Args, Debug)]
pub struct StaticArgs {
    /// Board name, or a substring of it.
    #[arg(long, short)]
    pub board: String,

    /// Bar colors, one per list (names, one-letter codes or #rrggbb).
    #[arg(long, short)]
    pub colors: Vec<String>,

    /// Lists to draw first, in this order; the rest follow alphabetically.
    #[arg(long, short)]
    pub lists: Vec<String>,

    /// Output file (default: <Board>Snapshot_<date>.svg).
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Reverse the bar order.
    #[arg(long, short)]
    pub reverse: bool,

    /// Fetch fresh data and overwrite the cache.
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct StaticOutput {
    board: String,
    path: PathBuf,
    cached: bool,
    total: usize,
    rows: Vec<SnapshotRow>,
    color_mismatch: bool,
}

pub fn run_static(args: &StaticArgs, ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.cache();
    let mut items = if args.force {
        Vec::new()
    } else {
        store.load_items().context("failed to read cached cards")?
    };
    let cached = !items.is_empty();

    if cached {
        tracing::info!(items = items.len(), path = %store.items_path().display(), "using cached cards");
    } else {
        let client = ctx.client()?;
        items = collect_items(&client, &args.board, ctx.config.chart.max_bucket_name_len)
            .with_context(|| format!("failed to collect cards for '{}'", args.board))?;
        store
            .save_items(&items, ctx.refresh_policy(args.force, &store.items_path()))
            .context("failed to cache cards")?;
        tracing::debug!(requests = client.requests(), "board service requests");
    }

    let counts = count_by_bucket(&items);
    let snapshot = Snapshot::arrange(
        &counts,
        &split_list(&args.lists),
        &split_list(&args.colors),
        args.reverse,
    );

    let date = today();
    let target = args
        .output
        .clone()
        .unwrap_or_else(|| default_snapshot_path(&args.board, date));
    let path = SvgChartRenderer::default()
        .render_snapshot(&snapshot, &snapshot_title(&args.board, date), &target)
        .context("failed to render snapshot chart")?;

    let value = StaticOutput {
        board: args.board.clone(),
        path,
        cached,
        total: snapshot.total(),
        color_mismatch: snapshot.color_mismatch,
        rows: snapshot.rows,
    };
    render(ctx.output, &value, |value, w| {
        if ctx.output.is_pretty() {
            for row in &value.rows {
                pretty_kv(w, &row.bucket, row.count.to_string())?;
            }
            pretty_kv(w, "total", value.total.to_string())?;
        }
        writeln!(w, "{}", value.path.display())
    })
}
