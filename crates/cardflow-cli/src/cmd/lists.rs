//! `cardflow lists`: the lists of one board.

use anyhow::Context as _;
use cardflow_core::pipeline::resolve_board;
use cardflow_core::source::{Board, BoardSource, Bucket};
use clap::Args;
use serde::Serialize;

use super::Context;
use crate::output::render;

#[derive(Args, Debug)]
pub struct ListsArgs {
    /// Board name, or a substring of it.
    #[arg(long, short)]
    pub board: String,
}

#[derive(Debug, Serialize)]
struct ListsOutput {
    board: Board,
    lists: Vec<Bucket>,
}

pub fn run_lists(args: &ListsArgs, ctx: &Context) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let board = resolve_board(&client, &args.board)
        .with_context(|| format!("failed to find board '{}'", args.board))?;
    let lists = client
        .list_buckets(&board.id)
        .with_context(|| format!("failed to list lists of '{}'", board.name))?;

    render(ctx.output, &ListsOutput { board, lists }, |value, w| {
        writeln!(w, "{}", header(&value.board, value.lists.len()))?;
        for list in &value.lists {
            writeln!(w, "'{}' (id={})", list.name, list.id)?;
        }
        Ok(())
    })
}

fn header(board: &Board, lists: usize) -> String {
    format!("==== board='{}', id={} {lists} lists ====", board.name, board.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_board_and_count() {
        let board = Board {
            id: "b1".into(),
            name: "Ops".into(),
        };
        assert_eq!(header(&board, 4), "==== board='Ops', id=b1 4 lists ====");
    }
}
