use bitflags::bitflags;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KeyModifiers: u8 {
        const CTRL = 1 << 0;
        const ALT = 1 << 1;
    }
}

/// Keyboard intake for the overlay. Tracks modifier state and latches the
/// Ctrl+Alt+I toggle chord until the host consumes it.
#[derive(Debug, Default)]
pub struct Input {
    modifiers: KeyModifiers,
    toggle_pressed: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_window_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            self.apply_key(&event.logical_key, event.state == ElementState::Pressed);
        }
    }

    pub fn apply_key(&mut self, key: &Key, pressed: bool) {
        match key {
            Key::Named(NamedKey::Control) => self.modifiers.set(KeyModifiers::CTRL, pressed),
            Key::Named(NamedKey::Alt) => self.modifiers.set(KeyModifiers::ALT, pressed),
            Key::Character(ch) => {
                if pressed
                    && ch.to_lowercase() == "i"
                    && self.modifiers.contains(KeyModifiers::CTRL | KeyModifiers::ALT)
                {
                    self.toggle_pressed = true;
                }
            }
            _ => {}
        }
    }

    /// Consumes the latched toggle chord, at most one per press.
    pub fn take_toggle_inspector(&mut self) -> bool {
        let pressed = self.toggle_pressed;
        self.toggle_pressed = false;
        pressed
    }

    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

    pub fn clear_frame(&mut self) {
        self.toggle_pressed = false;
    }
}
