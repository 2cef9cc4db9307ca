use anyhow::{Result, anyhow};
use log::warn;
use pico_args::Arguments;
use std::{env, path::PathBuf};

use crate::actions::{MouseSink, UinputSink};
use crate::config::{self, Settings};
use crate::engine::Button;
use crate::pipeline::{self, RunOptions};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    // Flags-based help (-h/--help)
    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("run") => {
            let config_path: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
            let source: Option<String> = pargs.opt_value_from_str("--source")?;
            let dry_run = pargs.contains("--dry-run");
            warn_unused(pargs);

            let settings = Settings::load(config_path.as_deref())?;
            log::info!("config: {}", settings.source.display());
            pipeline::run(settings, RunOptions { source, dry_run })?;
            Ok(())
        }

        Some("check") => {
            let config_path: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
            warn_unused(pargs);

            let settings = Settings::load(config_path.as_deref())?;
            print_response(&serde_json::json!({
                "ok": true,
                "data": {
                    "path": settings.source,
                    "engine": settings.engine,
                    "active_rect": settings.engine.active_rect(),
                    "tracker": settings.tracker_command,
                }
            }));
            Ok(())
        }

        Some("doctor") => {
            print_response(&serde_json::json!({"ok": true, "data": config::doctor_report()}));
            Ok(())
        }

        Some("emit") => {
            // usage:
            //   handctl emit move 960 540
            //   handctl emit click right
            //   handctl emit hold on
            let config_path: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
            let what: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: handctl emit <move|click|hold> ..."))?;
            let settings = Settings::load(config_path.as_deref())?;
            let mut sink = UinputSink::new(settings.engine.screen)?;
            match what.as_str() {
                "move" => {
                    let x: i32 = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: handctl emit move <x> <y>"))?;
                    let y: i32 = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: handctl emit move <x> <y>"))?;
                    sink.move_to(x, y)?;
                    println!("ok: moved to {x},{y}");
                }
                "click" => {
                    let btn: String = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: handctl emit click <left|right>"))?;
                    sink.click(parse_button(&btn)?)?;
                    println!("ok: clicked {btn}");
                }
                "hold" => {
                    let state: String = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: handctl emit hold <on|off>"))?;
                    let down = match state.as_str() {
                        "on" | "down" => true,
                        "off" | "up" => false,
                        other => return Err(anyhow!("unknown hold state: {other}")),
                    };
                    sink.set_button_down(Button::Left, down)?;
                    println!("ok: left button {}", if down { "down" } else { "up" });
                }
                other => return Err(anyhow!("unknown emit kind: {other}")),
            }
            warn_unused(pargs);
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn parse_button(s: &str) -> Result<Button> {
    match s.to_ascii_lowercase().as_str() {
        "left" => Ok(Button::Left),
        "right" => Ok(Button::Right),
        other => Err(anyhow!("unknown mouse button: {other}")),
    }
}

fn warn_unused(pargs: Arguments) {
    let rest = pargs.finish();
    if !rest.is_empty() {
        warn!("ignoring unused arguments: {rest:?}");
    }
}

fn print_help() {
    println!(
        r#"handctl — hand-gesture mouse control

USAGE:
  handctl help [command]                  Show general or command-specific help
  handctl run [--config P] [--source CMD] [--dry-run]
                                          Map tracker frames to pointer actions
  handctl check [--config P]              Validate and print the configuration
  handctl doctor                          Diagnose uinput permissions and config
  handctl emit move <x> <y>               Move the pointer
  handctl emit click <left|right>         Emit a mouse click
  handctl emit hold <on|off>              Press or release the left button

GESTURES (thumb, index, middle, ring, pinky):
  index only                              move pointer
  index + middle, tips pinched            left click
  index + middle + ring, tips pinched     right click
  thumb only                              toggle left-button hold
  fist                                    idle / re-arm the thumb toggle

TIPS:
  - Config: ~/.config/handctl/config.toml (created on first run)
  - Frames: one JSON object per line on stdin or from --source
  - Logging: RUST_LOG=debug handctl run
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: handctl run [--config <path>] [--source <cmd|->] [--dry-run]\n\
             Reads hand frames from the tracker command (or stdin with '-') and drives the pointer.\n\
             --dry-run logs pointer commands instead of emitting them."
        ),
        "check" => println!(
            "usage: handctl check [--config <path>]\nValidates the config and prints the resolved engine parameters."
        ),
        "doctor" => println!(
            "usage: handctl doctor\nChecks /dev/uinput, input group membership and the config file."
        ),
        "emit" => println!(
            "usage:\n  handctl emit move <x> <y>\n  handctl emit click <left|right>\n  handctl emit hold <on|off>"
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
