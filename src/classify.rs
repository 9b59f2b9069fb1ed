//! Change classification
//!
//! Maps a fired watch target to one of six logical actions. The mapping is
//! a closed, exhaustively-checked table: five targets rebuild an asset
//! class in place, the server target is terminal and restarts the
//! supervised process instead.

use serde::Serialize;

use crate::targets::TargetName;

/// The six recognized outcomes of classifying a file change.
///
/// The serialized form doubles as the build collaborator's incremental
/// target identifier and as the value of the child notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogicalAction {
    #[serde(rename = "clientCSS")]
    ClientCss,
    #[serde(rename = "acpCSS")]
    AcpCss,
    #[serde(rename = "js")]
    Js,
    #[serde(rename = "tpl")]
    Tpl,
    #[serde(rename = "lang")]
    Lang,
    #[serde(rename = "serverReload")]
    ServerReload,
}

impl LogicalAction {
    /// Identifier handed to the build collaborator.
    ///
    /// `ServerReload` is terminal and has no build target.
    pub fn build_id(&self) -> Option<&'static str> {
        match self {
            LogicalAction::ClientCss => Some("clientCSS"),
            LogicalAction::AcpCss => Some("acpCSS"),
            LogicalAction::Js => Some("js"),
            LogicalAction::Tpl => Some("tpl"),
            LogicalAction::Lang => Some("lang"),
            LogicalAction::ServerReload => None,
        }
    }
}

impl std::fmt::Display for LogicalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogicalAction::ClientCss => "clientCSS",
            LogicalAction::AcpCss => "acpCSS",
            LogicalAction::Js => "js",
            LogicalAction::Tpl => "tpl",
            LogicalAction::Lang => "lang",
            LogicalAction::ServerReload => "serverReload",
        };
        f.write_str(s)
    }
}

/// Classify a fired target into its logical action.
pub fn classify(target: TargetName) -> LogicalAction {
    match target {
        TargetName::StyleClient => LogicalAction::ClientCss,
        TargetName::StyleAdmin => LogicalAction::AcpCss,
        TargetName::Client => LogicalAction::Js,
        TargetName::Templates => LogicalAction::Tpl,
        TargetName::Languages => LogicalAction::Lang,
        TargetName::Server => LogicalAction::ServerReload,
    }
}

/// The one message shape delivered to the supervised process.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CompilingMessage {
    pub compiling: LogicalAction,
}

impl CompilingMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_total() {
        let actions: Vec<LogicalAction> = TargetName::ALL.into_iter().map(classify).collect();
        assert_eq!(
            actions,
            vec![
                LogicalAction::ClientCss,
                LogicalAction::AcpCss,
                LogicalAction::Js,
                LogicalAction::Tpl,
                LogicalAction::Lang,
                LogicalAction::ServerReload,
            ]
        );
    }

    #[test]
    fn test_only_server_is_terminal() {
        for name in TargetName::ALL {
            let action = classify(name);
            assert_eq!(action.build_id().is_none(), name == TargetName::Server);
        }
    }

    #[test]
    fn test_compiling_message_shape() {
        let message = CompilingMessage {
            compiling: LogicalAction::ClientCss,
        };
        assert_eq!(message.to_json(), r#"{"compiling":"clientCSS"}"#);

        let message = CompilingMessage {
            compiling: LogicalAction::AcpCss,
        };
        assert_eq!(message.to_json(), r#"{"compiling":"acpCSS"}"#);
    }
}
