//! Renders a decoded game (tags plus a [`MoveTree`]) as PGN text.

use std::fmt::Write as _;

use crate::cbh::{CbhRecord, GameResult};
use crate::model::tree::MoveTree;

/// The seven required tags plus the optional ones this format adds.
pub struct GameTags {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
    pub result: GameResult,
    pub white_elo: Option<u16>,
    pub black_elo: Option<u16>,
    pub fen: Option<String>,
}

impl GameTags {
    pub fn from_record(
        record: &CbhRecord,
        event: String,
        site: String,
        white: String,
        black: String,
        fen: Option<String>,
    ) -> Self {
        GameTags {
            event,
            site,
            date: record.pgn_date(),
            round: record.pgn_round(),
            white,
            black,
            result: record.result,
            white_elo: (record.white_elo != 0).then_some(record.white_elo),
            black_elo: (record.black_elo != 0).then_some(record.black_elo),
            fen,
        }
    }
}

/// Builds the PGN text for one game: tag roster, movetext with
/// parenthesized variations, and the trailing result token.
pub struct PgnTreeBuilder<'a> {
    tags: &'a GameTags,
    tree: &'a MoveTree,
}

impl<'a> PgnTreeBuilder<'a> {
    pub fn new(tags: &'a GameTags, tree: &'a MoveTree) -> Self {
        PgnTreeBuilder { tags, tree }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_tags(&mut out);
        out.push('\n');
        self.write_movetext(&mut out);
        out
    }

    fn write_tags(&self, out: &mut String) {
        let t = self.tags;
        writeln!(out, "[Event \"{}\"]", escape(&t.event)).unwrap();
        writeln!(out, "[Site \"{}\"]", escape(&t.site)).unwrap();
        writeln!(out, "[Date \"{}\"]", t.date).unwrap();
        writeln!(out, "[Round \"{}\"]", t.round).unwrap();
        writeln!(out, "[White \"{}\"]", escape(&t.white)).unwrap();
        writeln!(out, "[Black \"{}\"]", escape(&t.black)).unwrap();
        writeln!(out, "[Result \"{}\"]", t.result.pgn_token()).unwrap();
        if let Some(elo) = t.white_elo {
            writeln!(out, "[WhiteElo \"{elo}\"]").unwrap();
        }
        if let Some(elo) = t.black_elo {
            writeln!(out, "[BlackElo \"{elo}\"]").unwrap();
        }
        if let Some(fen) = &t.fen {
            writeln!(out, "[SetUp \"1\"]").unwrap();
            writeln!(out, "[FEN \"{fen}\"]").unwrap();
        }
    }

    fn write_movetext(&self, out: &mut String) {
        self.write_line(self.tree.root(), out, true);
        out.push(' ');
        out.push_str(self.tags.result.pgn_token());
        out.push('\n');
    }

    /// Writes the mainline continuation of `node`, recursing into any
    /// side variations in parentheses right after the move they branch
    /// from, matching PGN's nesting convention.
    fn write_line(&self, node: usize, out: &mut String, is_start: bool) {
        let mut current = node;
        let mut first = is_start;
        loop {
            let children = &self.tree.node(current).children;
            let Some(&mainline_child) = children.first() else {
                return;
            };
            let mv = self.tree.node(mainline_child).mv.unwrap();
            if !first {
                out.push(' ');
            }
            first = false;
            out.push_str(&mv.to_string());

            for &variation_child in &children[1..] {
                out.push_str(" (");
                out.push_str(&self.tree.node(variation_child).mv.unwrap().to_string());
                self.write_line(variation_child, out, false);
                out.push(')');
            }

            current = mainline_child;
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
