//! `cardflow summary`: one line per card of the chosen lists, ready to
//! paste into a chat channel.

use anyhow::Context as _;
use cardflow_core::pipeline::{BucketCards, collect_bucket_cards};
use cardflow_core::source::Label;
use clap::Args;
use serde::Serialize;

use super::{Context, split_list};
use crate::output::render;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Board name, or a substring of it.
    #[arg(long, short)]
    pub board: String,

    /// Lists to summarize, in order (comma-separated or repeated).
    #[arg(long, short, required = true)]
    pub lists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub list: String,
    pub position: usize,
    pub name: String,
    pub url: String,
    pub labels: Vec<String>,
}

impl SummaryLine {
    fn render(&self) -> String {
        format!(
            "{}-{:02}. `{}` {} labels={}",
            self.list,
            self.position,
            self.name,
            self.url,
            self.labels.join(" ")
        )
    }
}

/// Chat shorthand for a label: emoji codes for a few well-known labels and
/// colors, otherwise the lowercased label name.
pub fn label_tag(label: &Label) -> String {
    let name = label.name.to_lowercase();
    let color = label.color.as_deref().unwrap_or_default().to_lowercase();
    match (name.as_str(), color.as_str()) {
        ("bug", _) => ":bug:".to_string(),
        ("world", _) => ":globe_spin:".to_string(),
        (_, "red" | "blue") => format!(":{color}_circle:"),
        _ => name,
    }
}

pub fn summary_lines(picked: &[BucketCards]) -> Vec<SummaryLine> {
    picked
        .iter()
        .flat_map(|bucket| {
            bucket.cards.iter().enumerate().map(|(i, card)| {
                let mut labels: Vec<String> = card.labels.iter().map(label_tag).collect();
                labels.sort();
                SummaryLine {
                    list: bucket.bucket.name.clone(),
                    position: i + 1,
                    name: card.name.clone(),
                    url: card.short_url.clone(),
                    labels,
                }
            })
        })
        .collect()
}

pub fn run_summary(args: &SummaryArgs, ctx: &Context) -> anyhow::Result<()> {
    let names = split_list(&args.lists);
    let client = ctx.client()?;
    let picked = collect_bucket_cards(&client, &args.board, &names)
        .with_context(|| format!("failed to summarize board '{}'", args.board))?;
    let lines = summary_lines(&picked);
    tracing::info!(lists = picked.len(), cards = lines.len(), "built summary");

    render(ctx.output, &lines, |lines, w| {
        for line in lines {
            writeln!(w, "{}", line.render())?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardflow_core::source::{Bucket, RawCard};

    fn label(name: &str, color: Option<&str>) -> Label {
        Label {
            name: name.into(),
            color: color.map(str::to_string),
        }
    }

    #[test]
    fn label_tags_follow_emoji_rules() {
        assert_eq!(label_tag(&label("Bug", Some("red"))), ":bug:");
        assert_eq!(label_tag(&label("WORLD", None)), ":globe_spin:");
        assert_eq!(label_tag(&label("urgent", Some("Red"))), ":red_circle:");
        assert_eq!(label_tag(&label("infra", Some("blue"))), ":blue_circle:");
        assert_eq!(label_tag(&label("Infra", Some("green"))), "infra");
        assert_eq!(label_tag(&label("", None)), "");
    }

    #[test]
    fn lines_number_cards_per_list_and_sort_labels() {
        let picked = vec![BucketCards {
            bucket: Bucket {
                id: "l1".into(),
                name: "Doing".into(),
            },
            cards: vec![
                RawCard {
                    id: "c1".into(),
                    name: "Fix parser".into(),
                    short_url: "https://trello.com/c/abc".into(),
                    labels: vec![label("world", None), label("bug", None)],
                    ..RawCard::default()
                },
                RawCard {
                    id: "c2".into(),
                    name: "Docs".into(),
                    short_url: "https://trello.com/c/def".into(),
                    ..RawCard::default()
                },
            ],
        }];
        let lines = summary_lines(&picked);
        assert_eq!(
            lines[0].render(),
            "Doing-01. `Fix parser` https://trello.com/c/abc labels=:bug: :globe_spin:"
        );
        assert_eq!(
            lines[1].render(),
            "Doing-02. `Docs` https://trello.com/c/def labels="
        );
    }
}
