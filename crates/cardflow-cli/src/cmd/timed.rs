//! `cardflow timed`: daily list counts since the board's first activity.

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use cardflow_core::cache::Watermark;
use cardflow_core::pipeline::collect_counts;
use cardflow_core::timeseries::CountMatrix;
use clap::Args;
use serde::Serialize;

use super::{Context, split_list, today};
use crate::chart::{
    ChartRenderer, Colormap, Palette, SvgChartRenderer, default_time_series_path,
    series_columns, time_series_title,
};
use crate::output::{pretty_kv, render};

#[derive(Args, Debug)]
pub struct TimedArgs {
    /// Board name, or a substring of it.
    #[arg(long, short)]
    pub board: String,

    /// Lists to chart, stacked in this order (default: all).
    #[arg(long, short)]
    pub lists: Vec<String>,

    /// Colormap name (summer, autumn, winter, spring, cool, jet) or
    /// explicit colors, one per list.
    #[arg(long, short)]
    pub colors: Vec<String>,

    /// Output file (default: <Board>TimeSeries_<date>.svg).
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Pull the full history again and overwrite the cache.
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct TimedOutput {
    board: String,
    path: PathBuf,
    cached: bool,
    watermark: Watermark,
    days: usize,
    lists: Vec<String>,
}

/// Cached counts and their watermark, when both are present and usable.
fn cached_counts(ctx: &Context) -> anyhow::Result<Option<(Watermark, CountMatrix)>> {
    let store = ctx.cache();
    let matrix = store.load_counts().context("failed to read cached counts")?;
    if matrix.is_empty() {
        return Ok(None);
    }
    let Some(watermark) = store
        .load_watermark()
        .context("failed to read cached start date")?
    else {
        tracing::info!("cached counts have no start date, refreshing");
        return Ok(None);
    };
    tracing::info!(
        path = %store.counts_path().display(),
        days = matrix.len(),
        %watermark,
        "using cached counts"
    );
    Ok(Some((watermark, matrix)))
}

pub fn run_timed(args: &TimedArgs, ctx: &Context) -> anyhow::Result<()> {
    let palette = Palette::parse(&split_list(&args.colors), Colormap::Cool)?;
    let selected = split_list(&args.lists);

    let cached = if args.force { None } else { cached_counts(ctx)? };
    let from_cache = cached.is_some();
    let (watermark, matrix) = if let Some(hit) = cached {
        hit
    } else {
        let client = ctx.client()?;
        let run = collect_counts(&client, &args.board, ctx.config.api.batch_size)
            .with_context(|| format!("failed to collect activity for '{}'", args.board))?;
        let store = ctx.cache();
        let policy = ctx.refresh_policy(args.force, &store.counts_path());
        store
            .save_series(&run.matrix, run.watermark, policy)
            .context("failed to cache counts")?;
        tracing::debug!(
            requests = client.requests(),
            items = run.items,
            events = run.events,
            "board service requests"
        );
        (run.watermark, run.matrix)
    };

    let date = today();
    let target = args
        .output
        .clone()
        .unwrap_or_else(|| default_time_series_path(&args.board, date));
    let lists = series_columns(&matrix, &selected);
    if !selected.is_empty() && lists.is_empty() {
        bail!("none of the lists {selected:?} have counts on '{}'", args.board);
    }
    let path = SvgChartRenderer::default()
        .render_time_series(
            &matrix,
            &lists,
            &palette,
            &time_series_title(&args.board, matrix.len(), date),
            &target,
        )
        .context("failed to render time series chart")?;

    let value = TimedOutput {
        board: args.board.clone(),
        path,
        cached: from_cache,
        watermark,
        days: matrix.len(),
        lists,
    };
    render(ctx.output, &value, |value, w| {
        if ctx.output.is_pretty() {
            pretty_kv(w, "since", value.watermark.to_string())?;
            pretty_kv(w, "days", value.days.to_string())?;
            pretty_kv(w, "lists", value.lists.join(", "))?;
        }
        writeln!(w, "{}", value.path.display())
    })
}
