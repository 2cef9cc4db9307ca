use anyhow::Result;
use log::info;
#[cfg(not(target_os = "linux"))]
use log::warn;

use crate::engine::Button;
use crate::smoothing::ScreenSize;

/// Receiver of pointer commands.
pub trait MouseSink {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;
    fn click(&mut self, button: Button) -> Result<()>;
    fn set_button_down(&mut self, button: Button, down: bool) -> Result<()>;
}

/// Pointer sink backed by a Linux `uinput` device, or a logging no-op.
pub struct UinputSink {
    #[cfg(target_os = "linux")]
    linux: Option<LinuxUinput>,
}

impl UinputSink {
    /// Virtual absolute pointer whose axes span `screen`.
    pub fn new(screen: ScreenSize) -> Result<Self> {
        #[cfg(target_os = "linux")]
        {
            let dev = LinuxUinput::create(screen)?;
            Ok(Self { linux: Some(dev) })
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = screen;
            warn!("uinput not available; running in NO-OP mode");
            Ok(Self::noop())
        }
    }

    /// Logs commands instead of emitting them.
    pub fn noop() -> Self {
        Self {
            #[cfg(target_os = "linux")]
            linux: None,
        }
    }
}

impl MouseSink for UinputSink {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        #[cfg(target_os = "linux")]
        if let Some(dev) = self.linux.as_mut() {
            return dev.move_to(x, y);
        }
        log::trace!("noop: move {x},{y}");
        Ok(())
    }

    fn click(&mut self, button: Button) -> Result<()> {
        #[cfg(target_os = "linux")]
        if let Some(dev) = self.linux.as_mut() {
            return dev.click(button);
        }
        info!("noop: click {}", button.as_str());
        Ok(())
    }

    fn set_button_down(&mut self, button: Button, down: bool) -> Result<()> {
        #[cfg(target_os = "linux")]
        if let Some(dev) = self.linux.as_mut() {
            return dev.set_button(button, down);
        }
        info!(
            "noop: {} button {}",
            button.as_str(),
            if down { "down" } else { "up" }
        );
        Ok(())
    }
}

#[cfg(target_os = "linux")]
struct LinuxUinput {
    dev: uinput::device::Device,
}

#[cfg(target_os = "linux")]
fn mouse_button(button: Button) -> uinput::event::controller::Mouse {
    use uinput::event::controller::Mouse;
    match button {
        Button::Left => Mouse::Left,
        Button::Right => Mouse::Right,
    }
}

#[cfg(target_os = "linux")]
impl LinuxUinput {
    fn create(screen: ScreenSize) -> Result<Self> {
        use uinput::event::{absolute::Position, controller::Mouse};

        let max_x = i32::try_from(screen.width).unwrap_or(i32::MAX);
        let max_y = i32::try_from(screen.height).unwrap_or(i32::MAX);
        let dev = uinput::default()?
            .name("Handctl Virtual Pointer")?
            // absolute axes sized to the screen
            .event(Position::X)?
            .min(0)
            .max(max_x)
            .event(Position::Y)?
            .min(0)
            .max(max_y)
            // mouse buttons
            .event(Mouse::Left)?
            .event(Mouse::Right)?
            .create()?;

        info!("uinput: created virtual pointer {max_x}x{max_y}");
        Ok(Self { dev })
    }

    fn sync(&mut self) -> Result<()> {
        self.dev.synchronize()?;
        Ok(())
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        use uinput::event::absolute::Position;
        self.dev.send(Position::X, x)?;
        self.dev.send(Position::Y, y)?;
        self.sync()
    }

    fn set_button(&mut self, button: Button, down: bool) -> Result<()> {
        self.dev.send(mouse_button(button), i32::from(down))?;
        self.sync()
    }

    fn click(&mut self, button: Button) -> Result<()> {
        self.set_button(button, true)?;
        self.set_button(button, false)
    }
}
