/// Campaign program error decoding
///
/// Turns a failed instruction submission into the message shown to the user.
/// Resolution order: explicit custom code, the Anchor error log line, catalog
/// substring matches, well-known runtime substrings, then a generic fallback.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Raw failure returned by the ledger when a program call is rejected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramFailure {
    /// Custom program error code, when the runtime reported one
    pub code: Option<u32>,
    pub message: String,
    pub logs: Vec<String>,
}

impl ProgramFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            logs: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_logs(mut self, logs: Vec<String>) -> Self {
        self.logs = logs;
        self
    }

    fn joined_logs(&self) -> String {
        self.logs.join(" ")
    }
}

/// One entry of the program's error catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDefinition {
    pub code: u32,
    pub name: &'static str,
    pub msg: &'static str,
}

/// Error catalog of the campaign program (Anchor custom errors start at 6000)
pub const CAMPAIGN_ERRORS: &[ErrorDefinition] = &[
    ErrorDefinition {
        code: 6000,
        name: "InvalidTitleLength",
        msg: "Title exceeds the maximum length",
    },
    ErrorDefinition {
        code: 6001,
        name: "InvalidDescriptionLength",
        msg: "Description exceeds the maximum length",
    },
    ErrorDefinition {
        code: 6002,
        name: "InvalidTargetAmount",
        msg: "Target amount must be greater than zero",
    },
    ErrorDefinition {
        code: 6003,
        name: "InvalidContributionAmount",
        msg: "Contribution amount must be greater than zero",
    },
    ErrorDefinition {
        code: 6004,
        name: "CampaignClosed",
        msg: "Campaign is already closed",
    },
    ErrorDefinition {
        code: 6005,
        name: "Unauthorized",
        msg: "Only the campaign author can withdraw funds",
    },
    ErrorDefinition {
        code: 6006,
        name: "MathOverflow",
        msg: "Arithmetic overflow",
    },
    ErrorDefinition {
        code: 6007,
        name: "NoFundsToWithdraw",
        msg: "Campaign has no funds to withdraw",
    },
];

static ANCHOR_LOG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"AnchorError occurred\. Error Code: (\w+)\. Error Number: (\d+)\. Error Message: ([^\.]+)",
    )
    .expect("static regex")
});

static CUSTOM_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"custom program error: 0x([0-9a-fA-F]+)").expect("static regex"));

const GENERIC_ERROR: &str = "An unexpected error occurred. Please try again.";
const DUPLICATE_TITLE: &str =
    "A campaign with this title already exists. Please choose a different title.";

/// Decoded program error: catalog identity plus the message for the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramError {
    pub code: Option<u32>,
    pub name: Option<String>,
    pub user_message: String,
    pub logs: Vec<String>,
}

impl std::fmt::Display for ProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.name, self.code) {
            (Some(name), Some(code)) => {
                write!(f, "Program error {} ({}): {}", name, code, self.user_message)
            }
            _ => write!(f, "Program error: {}", self.user_message),
        }
    }
}

impl ProgramError {
    /// Decode a failure from one of the campaign instructions
    pub fn from_failure(failure: &ProgramFailure) -> Self {
        let parsed = parse_program_error(failure);
        Self {
            code: parsed.as_ref().map(|p| p.code).or(failure.code),
            name: parsed.as_ref().map(|p| p.name.clone()),
            user_message: campaign_specific_error(failure),
            logs: failure.logs.clone(),
        }
    }
}

/// Catalog match for a failure
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProgramError {
    pub code: u32,
    pub name: String,
    pub msg: String,
}

impl From<&ErrorDefinition> for ParsedProgramError {
    fn from(def: &ErrorDefinition) -> Self {
        Self {
            code: def.code,
            name: def.name.to_string(),
            msg: def.msg.to_string(),
        }
    }
}

fn lookup_code(code: u32) -> Option<&'static ErrorDefinition> {
    CAMPAIGN_ERRORS.iter().find(|def| def.code == code)
}

/// Resolve a failure against the error catalog
pub fn parse_program_error(failure: &ProgramFailure) -> Option<ParsedProgramError> {
    let code = failure.code.or_else(|| {
        CUSTOM_CODE_PATTERN
            .captures(&failure.message)
            .and_then(|caps| u32::from_str_radix(&caps[1], 16).ok())
    });

    if let Some(code) = code {
        if let Some(def) = lookup_code(code) {
            return Some(def.into());
        }
    }

    let logs = failure.joined_logs();
    if let Some(caps) = ANCHOR_LOG_PATTERN.captures(&logs) {
        let name = caps[1].to_string();
        let number = caps[2].parse::<u32>().unwrap_or_default();
        let msg = caps[3].trim().to_string();

        if let Some(def) = CAMPAIGN_ERRORS
            .iter()
            .find(|def| def.code == number || def.name == name)
        {
            return Some(def.into());
        }

        return Some(ParsedProgramError {
            code: number,
            name,
            msg,
        });
    }

    let haystacks = [logs.as_str(), failure.message.as_str()];
    CAMPAIGN_ERRORS
        .iter()
        .find(|def| {
            haystacks
                .iter()
                .any(|h| h.contains(def.name) || h.contains(def.msg))
        })
        .map(ParsedProgramError::from)
}

/// Generic user-facing message for any program/runtime failure
pub fn human_readable_error(failure: &ProgramFailure) -> String {
    if let Some(parsed) = parse_program_error(failure) {
        return parsed.msg;
    }

    let text = format!("{} {}", failure.message, failure.joined_logs());

    if text.contains("already in use") {
        return "Campaign with this title already exists. Please choose a different title."
            .to_string();
    }
    if text.contains("Blockhash not found") {
        return "Transaction timed out. Please try again.".to_string();
    }
    if text.contains("User rejected") {
        return "Transaction was cancelled by user.".to_string();
    }
    if text.contains("Insufficient funds") || text.contains("insufficient lamports") {
        return "Insufficient SOL balance for transaction fee.".to_string();
    }
    if text.contains("DeclaredProgramIdMismatch") {
        return "Program configuration error. Please contact support.".to_string();
    }

    GENERIC_ERROR.to_string()
}

/// Campaign-flow message: rewrites the catalog errors users hit most often
pub fn campaign_specific_error(failure: &ProgramFailure) -> String {
    if let Some(parsed) = parse_program_error(failure) {
        return match parsed.name.as_str() {
            "InvalidTitleLength" => "Title is too long. Please use a shorter title.".to_string(),
            "InvalidDescriptionLength" => {
                "Description is too long. Please shorten your description.".to_string()
            }
            "InvalidTargetAmount" => "Target amount must be greater than zero.".to_string(),
            "MathOverflow" => "Amount too large. Please use a smaller amount.".to_string(),
            _ => parsed.msg,
        };
    }

    if failure.message.contains("already in use")
        || failure.message.contains("AccountAlreadyInitialized")
    {
        return DUPLICATE_TITLE.to_string();
    }

    let logs = failure.joined_logs();
    if logs.contains("seed") && logs.contains("already") {
        return "This campaign title is already taken. Please choose a different title."
            .to_string();
    }

    human_readable_error(failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_code_uses_catalog() {
        let failure = ProgramFailure::new("custom").with_code(6002);
        let err = ProgramError::from_failure(&failure);
        assert_eq!(err.name.as_deref(), Some("InvalidTargetAmount"));
        assert_eq!(err.user_message, "Target amount must be greater than zero.");
    }

    #[test]
    fn hex_custom_code_in_message() {
        // 0x1776 == 6006
        let failure = ProgramFailure::new(
            "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1776",
        );
        assert_eq!(
            campaign_specific_error(&failure),
            "Amount too large. Please use a smaller amount."
        );
    }

    #[test]
    fn anchor_log_line_is_parsed() {
        let failure = ProgramFailure::new("simulation failed").with_logs(vec![
            "Program log: Instruction: WithdrawAll".to_string(),
            "Program log: AnchorError occurred. Error Code: Unauthorized. Error Number: 6005. Error Message: Only the campaign author can withdraw funds."
                .to_string(),
        ]);
        let parsed = parse_program_error(&failure).unwrap();
        assert_eq!(parsed.code, 6005);
        assert_eq!(
            human_readable_error(&failure),
            "Only the campaign author can withdraw funds"
        );
    }

    #[test]
    fn unknown_anchor_error_keeps_logged_message() {
        let failure = ProgramFailure::new("failed").with_logs(vec![
            "AnchorError occurred. Error Code: SomethingNew. Error Number: 6100. Error Message: Brand new failure."
                .to_string(),
        ]);
        let parsed = parse_program_error(&failure).unwrap();
        assert_eq!(parsed.name, "SomethingNew");
        assert_eq!(parsed.msg, "Brand new failure");
    }

    #[test]
    fn known_substrings_fall_back() {
        let cases = [
            ("Blockhash not found", "Transaction timed out. Please try again."),
            ("User rejected the request", "Transaction was cancelled by user."),
            ("Insufficient funds for fee", "Insufficient SOL balance for transaction fee."),
            ("socket hang up", GENERIC_ERROR),
        ];
        for (message, expected) in cases {
            assert_eq!(human_readable_error(&ProgramFailure::new(message)), expected);
        }
    }

    #[test]
    fn duplicate_campaign_title() {
        let failure = ProgramFailure::new("Allocate: account Address { .. } already in use");
        assert_eq!(campaign_specific_error(&failure), DUPLICATE_TITLE);
    }
}
