pub enum Event {
    TreeEvent(TreeEvent),
    AppEvent(AppEvent),
}

/// Events that change the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// Insert a point at the cursor
    Insert,

    /// Delete the point near the cursor
    Delete,

    /// Set a corner of the query rectangle at the cursor. The second corner runs the query.
    Select,

    /// Remove every point
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    CursorEvent(CursorEvent),

    /// Show the next coarser (`1`) or finer (`-1`) layer
    Layer(i32),

    /// Log the shown layer
    Dump,

    /// Show or hide the branch outlines
    ToggleLayout,

    Resize { cols: u16, rows: u16 },

    /// Exit the application
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorEvent {
    Up,
    Down,
    Left,
    Right,
}
