//! `cardflow boards`: boards visible to the credentials.

use anyhow::Context as _;
use cardflow_core::source::{Board, BoardSource};

use super::Context;
use crate::output::{pretty_section, render};

pub fn run_boards(ctx: &Context) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let boards = client.list_boards().context("failed to list boards")?;
    tracing::info!(boards = boards.len(), requests = client.requests(), "listed boards");

    render(ctx.output, &boards, |boards, w| {
        if ctx.output.is_pretty() {
            pretty_section(w, &format!("{} boards", boards.len()))?;
        }
        for board in boards {
            writeln!(w, "{}", board_line(board))?;
        }
        Ok(())
    })
}

fn board_line(board: &Board) -> String {
    format!("'{}' (id={})", board.name, board.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_line_quotes_name() {
        let board = Board {
            id: "5b8f".into(),
            name: "Team Roadmap".into(),
        };
        assert_eq!(board_line(&board), "'Team Roadmap' (id=5b8f)");
    }
}
