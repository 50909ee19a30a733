/// External shortcut service. The overlay only drives its lifecycle: enabled
/// while the overlay is open, disabled when it closes.
pub trait Shortcuts {
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
}

/// Default in-process implementation tracking only the enabled flag.
#[derive(Debug, Default)]
pub struct ShortcutState {
    enabled: bool,
}

impl Shortcuts for ShortcutState {
    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
