//! Replays recorded interactions from a cassette.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use super::format::{Cassette, Interaction};

/// Replays interactions from a loaded cassette, serving them in recorded
/// order per `(port, method)` pair.
#[derive(Debug)]
pub struct CassetteReplayer {
    name: String,
    queues: HashMap<(String, String), VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<(String, String), VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push_back(interaction.clone());
        }
        Self { name: cassette.name.clone(), queues }
    }

    /// Load a cassette file and create a replayer for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, String> {
        Cassette::load(path).map(|cassette| Self::new(&cassette))
    }

    /// Interactions still queued for `port`/`method`.
    #[must_use]
    pub fn remaining(&self, port: &str, method: &str) -> usize {
        self.queues.get(&(port.to_string(), method.to_string())).map_or(0, VecDeque::len)
    }

    /// Return the next interaction for the given port and method.
    ///
    /// # Panics
    ///
    /// Panics if the cassette has no (more) interactions for the given
    /// port/method combination, naming what was requested and which
    /// port/method pairs the cassette does hold.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Interaction {
        let key = (port.to_string(), method.to_string());
        let Some(queue) = self.queues.get_mut(&key) else {
            let mut available: Vec<String> =
                self.queues.keys().map(|(p, m)| format!("{p}::{m}")).collect();
            available.sort();
            panic!(
                "Cassette {name:?} exhausted: no interactions recorded for port={port:?} \
                 method={method:?}. Available port::method pairs: [{}]",
                available.join(", "),
                name = self.name,
            );
        };
        queue.pop_front().unwrap_or_else(|| {
            panic!(
                "Cassette {name:?} exhausted: all interactions for port={port:?} \
                 method={method:?} have been consumed.",
                name = self.name,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, port: &str, prompt: &str, text: &str) -> Interaction {
        Interaction {
            seq,
            port: port.into(),
            method: "complete".into(),
            input: json!({"prompt": prompt}),
            output: json!({"Ok": {"text": text}}),
        }
    }

    fn make_cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            backend: "ollama/test".into(),
            interactions,
        }
    }

    #[test]
    fn serves_interactions_in_recorded_order() {
        let cassette = make_cassette(vec![
            interaction(0, "llm", "foo", "Does foo."),
            interaction(1, "other", "x", "y"),
            interaction(2, "llm", "bar", "Does bar."),
        ]);

        let mut replayer = CassetteReplayer::new(&cassette);
        assert_eq!(replayer.remaining("llm", "complete"), 2);

        let first = replayer.next_interaction("llm", "complete");
        assert_eq!(first.seq, 0);
        assert_eq!(first.output, json!({"Ok": {"text": "Does foo."}}));

        let second = replayer.next_interaction("llm", "complete");
        assert_eq!(second.seq, 2);
        assert_eq!(replayer.remaining("llm", "complete"), 0);
        assert_eq!(replayer.remaining("other", "complete"), 1);
    }

    #[test]
    #[should_panic(expected = "have been consumed")]
    fn exhausted_replayer_panics_with_descriptive_message() {
        let cassette = make_cassette(vec![interaction(0, "llm", "foo", "Does foo.")]);

        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_interaction("llm", "complete"); // consumes the only one
        let _ = replayer.next_interaction("llm", "complete"); // should panic
    }

    #[test]
    #[should_panic(expected = "no interactions recorded")]
    fn unknown_port_panics() {
        let cassette = make_cassette(vec![]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_interaction("unknown", "method");
    }
}
