//! Broker topic names.
//!
//! The topic names are fixed literals shared with the deployed clients, so
//! every client and service on a broker sees the same streams. Requests and
//! responses are told apart by the request id carried in each envelope.

/// Maze requests. Client → Maze service.
pub const LABYRINTH_QUERY: &str = "labyrinth/query";

/// Maze responses. Maze service → Client.
pub const LABYRINTH_RESPONSE: &str = "labyrinth/response";

/// Tic-tac-toe moves. Client → Tic-tac-toe service.
pub const TICTACTOE_INPUT: &str = "tictactoe/input";

/// Tic-tac-toe outcomes. Tic-tac-toe service → Client.
pub const TICTACTOE_OUTPUT: &str = "tictactoe/output";

/// A query topic and the topic its responses come back on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPair {
    /// Where requests are published.
    pub query: String,
    /// Where responses are published.
    pub response: String,
}

impl TopicPair {
    /// Build a pair from arbitrary topic names.
    #[must_use]
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }

    /// `labyrinth/query` → `labyrinth/response`.
    #[must_use]
    pub fn labyrinth() -> Self {
        Self::new(LABYRINTH_QUERY, LABYRINTH_RESPONSE)
    }

    /// `tictactoe/input` → `tictactoe/output`.
    #[must_use]
    pub fn tictactoe() -> Self {
        Self::new(TICTACTOE_INPUT, TICTACTOE_OUTPUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labyrinth_pair() {
        let pair = TopicPair::labyrinth();
        assert_eq!(pair.query, "labyrinth/query");
        assert_eq!(pair.response, "labyrinth/response");
    }

    #[test]
    fn test_tictactoe_pair() {
        let pair = TopicPair::tictactoe();
        assert_eq!(pair.query, "tictactoe/input");
        assert_eq!(pair.response, "tictactoe/output");
    }
}
