use std::io;

pub type Tui = ratatui::DefaultTerminal;

/// Enter the alternate screen in raw mode.
pub fn init() -> io::Result<Tui> {
    ratatui::try_init()
}

pub fn restore() -> io::Result<()> {
    ratatui::try_restore()
}
