//! # Command line
//!
//! Global `--actor` (or `FEEDBACK_BOARD_ACTOR`) plus one subcommand per
//! board operation. Write commands run behind the balance gate.

use clap::{Parser, Subcommand, ValueEnum};
use domains::{FeedbackType, VoteDirection};

#[derive(Debug, Parser)]
#[command(name = "feedback-board", version, about = "Ledger-anchored feedback boards")]
pub struct Cli {
    /// Acting account address
    #[arg(long, env = "FEEDBACK_BOARD_ACTOR", global = true)]
    pub actor: Option<String>,

    /// Do not run the balance check before writes
    #[arg(long, global = true)]
    pub skip_balance_check: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new board owned by the actor
    CreateBoard {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: String,
    },
    /// Add feedback to a board
    Submit {
        #[arg(long)]
        board: String,
        #[arg(long)]
        text: String,
        /// positive, negative or neutral; inferred from the text when omitted
        #[arg(long = "type")]
        feedback_type: Option<FeedbackType>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Up- or downvote a feedback item
    Vote {
        #[arg(long)]
        board: String,
        #[arg(long)]
        feedback: String,
        #[arg(long, value_enum)]
        direction: Direction,
    },
    /// Print a board and its current document
    Show {
        #[arg(long)]
        board: String,
    },
    /// List boards owned by an account (the actor by default)
    Boards {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Check whether an account can afford a write
    Balance {
        #[arg(long)]
        account: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Direction {
    Up,
    Down,
}

impl From<Direction> for VoteDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => VoteDirection::Up,
            Direction::Down => VoteDirection::Down,
        }
    }
}

impl Command {
    /// Commands that end in a ledger transaction.
    pub fn writes(&self) -> bool {
        matches!(
            self,
            Command::CreateBoard { .. } | Command::Submit { .. } | Command::Vote { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_with_tags() {
        let cli = Cli::try_parse_from([
            "feedback-board",
            "--actor",
            "alice",
            "submit",
            "--board",
            "0xb",
            "--text",
            "some text",
            "--type",
            "negative",
            "--tag",
            "ux",
            "--tag",
            "perf",
        ])
        .unwrap();
        assert_eq!(cli.actor.as_deref(), Some("alice"));
        match cli.command {
            Command::Submit {
                feedback_type,
                tags,
                ..
            } => {
                assert_eq!(feedback_type, Some(FeedbackType::Negative));
                assert_eq!(tags, vec!["ux", "perf"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_direction() {
        assert!(Cli::try_parse_from([
            "feedback-board",
            "vote",
            "--board",
            "b",
            "--feedback",
            "f",
            "--direction",
            "sideways",
        ])
        .is_err());
    }

    #[test]
    fn only_mutations_write() {
        let show = Command::Show { board: "b".into() };
        let vote = Command::Vote {
            board: "b".into(),
            feedback: "f".into(),
            direction: Direction::Up,
        };
        assert!(!show.writes());
        assert!(vote.writes());
    }
}
