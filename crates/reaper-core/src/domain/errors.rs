//! Errors - エラー型と分類
//!
//! すべての port と app ループはこの `ReaperError` を返します。
//! どのエラーが「数える」対象で、どれが致命的かは呼び出し側（app 層）が決めます。
//!
//! | variant          | 扱い                                             |
//! |------------------|--------------------------------------------------|
//! | `Parse`          | claim を skip、pass のエラー数に加算            |
//! | `NotFound`       | skip（claim が途中で消えた）                     |
//! | `Transport`      | エラー数に加算、通知なら counter を進めない      |
//! | `MalformedEvent` | 黙って捨てる（数えない）                         |
//! | `Watch`          | controller 起動時のみ致命的                      |
//! | `WatchClosed`    | supervisor に返して再起動させる                  |
//! | `Config`         | 起動前に弾く                                     |

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaperError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("not found: {kind} {namespace}/{name}")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed watch event: {0}")]
    MalformedEvent(String),

    #[error("failed to establish workload watch: {0}")]
    Watch(String),

    #[error("workload watch stream closed")]
    WatchClosed,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReaperError {
    pub fn claim_not_found(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "claim",
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_claim() {
        let err = ReaperError::claim_not_found("team-a", "data-db-0");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: claim team-a/data-db-0");
    }

    #[test]
    fn transport_is_not_not_found() {
        let err = ReaperError::Transport("connection reset".to_string());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("connection reset"));
    }
}
