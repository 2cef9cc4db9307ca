use anyhow::Result;

use crate::actions::MouseSink;
use crate::engine::MouseAction;

pub fn dispatch_action<S: MouseSink + ?Sized>(action: &MouseAction, sink: &mut S) -> Result<()> {
    match *action {
        MouseAction::Move { x, y } => sink.move_to(x.round() as i32, y.round() as i32),
        MouseAction::Click(button) => sink.click(button),
        MouseAction::SetButtonDown { button, down } => sink.set_button_down(button, down),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use anyhow::{Result, anyhow};

    use crate::actions::MouseSink;
    use crate::engine::Button;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Move(i32, i32),
        Click(Button),
        Button(Button, bool),
    }

    /// Sink that records every call; optionally fails clicks.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub calls: Vec<Call>,
        pub fail_clicks: bool,
    }

    impl MouseSink for RecordingSink {
        fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
            self.calls.push(Call::Move(x, y));
            Ok(())
        }

        fn click(&mut self, button: Button) -> Result<()> {
            if self.fail_clicks {
                return Err(anyhow!("click rejected"));
            }
            self.calls.push(Call::Click(button));
            Ok(())
        }

        fn set_button_down(&mut self, button: Button, down: bool) -> Result<()> {
            self.calls.push(Call::Button(button, down));
            Ok(())
        }
    }
}
