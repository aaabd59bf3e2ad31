/// What a command handler decided should happen (§4.2: "ok,
/// handled-with-reply, client-should-be-dropped"). The dispatcher — not the
/// handler — turns this into the actual wire line, so handlers never repeat
/// `success\n` boilerplate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ok,
    Reply(String),
    Drop,
}

impl DispatchOutcome {
    pub fn huh(message: impl Into<String>) -> Self {
        DispatchOutcome::Reply(format!("huh? {}", message.into()))
    }
}
