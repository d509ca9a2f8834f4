//! Player-facing build commands.
//!
//! One enum per intent the client can express. Commands carry only ids and
//! flags; positions always come from the server-side preview so the client
//! cannot place somewhere it is not looking.

/// A build intent from a player. Dispatched by the engine to [`super::handlers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildCommand {
    /// Start previewing a catalog item.
    SelectItem { catalog_id: String },
    /// Rotate the current preview a quarter turn.
    Rotate,
    /// Commit the current preview as a placement.
    Place,
    /// Enter delete mode (highlighting).
    StartDelete,
    /// Delete a placed item: the given id, or the highlighted target.
    Delete { placed_item_id: Option<String> },
    /// Leave build mode entirely.
    Cancel,
}
