//! Command-line arguments of the `serviparts` binary.

use serviparts_core::error::CoreError;
use serviparts_core::types::{is_persisted_id, RecordId};

/// One invocation of the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print the maintenance request list.
    List,
    /// Print one request with its checklist.
    Show(RecordId),
    /// Download the report PDF of a request.
    Print(RecordId),
}

pub const USAGE: &str = "usage: serviparts [list | show <id> | print <id>]";

impl Command {
    /// Parse the arguments after the program name. No arguments means `list`.
    pub fn parse<I, S>(args: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let words: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

        match words.as_slice() {
            [] | ["list"] => Ok(Command::List),
            ["show", id] => Ok(Command::Show(parse_id(id)?)),
            ["print", id] => Ok(Command::Print(parse_id(id)?)),
            _ => Err(CoreError::Validation(USAGE.to_string())),
        }
    }
}

fn parse_id(raw: &str) -> Result<RecordId, CoreError> {
    raw.parse()
        .ok()
        .filter(|id| is_persisted_id(*id))
        .ok_or_else(|| CoreError::Validation(format!("'{raw}' is not a request id")))
}
