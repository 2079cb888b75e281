//! AutoYaST XML post-processing.
//!
//! SUSE answer files are XML documents. After template rendering the
//! document gets bookkeeping spliced in ahead of the root close tag:
//! a `<bootforge>` element naming the server and the rendered object,
//! and callback script stanzas that disable netboot after install
//! (`pxe_just_once`) and report install start/finish back to the
//! install-trigger endpoints (`run_install_triggers`).

use bootforge_resolver::Blended;
use bootforge_types::{ForgeError, ItemKind, Result};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::Value;

/// Splice bookkeeping and callback scripts into a rendered AutoYaST
/// document.
pub fn postprocess(xml: &str, kind: ItemKind, name: &str, blended: &Blended) -> Result<String> {
    let http_server = blended
        .get("http_server")
        .and_then(Value::as_str)
        .unwrap_or("127.0.0.1")
        .to_string();
    let prefix = blended
        .get("service_prefix")
        .and_then(Value::as_str)
        .unwrap_or("bootforge/svc")
        .to_string();
    let pxe_just_once = blended
        .get("pxe_just_once")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let run_install_triggers = blended
        .get("run_install_triggers")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;
    let mut has_bookkeeping = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth == 2 && e.name().as_ref() == b"bootforge" {
                    has_bookkeeping = true;
                }
                write_event(&mut writer, Event::Start(e))?;
            }
            Ok(Event::Empty(e)) => {
                if depth == 1 && e.name().as_ref() == b"bootforge" {
                    has_bookkeeping = true;
                }
                write_event(&mut writer, Event::Empty(e))?;
            }
            Ok(Event::End(e)) => {
                depth -= 1;
                if depth == 0 {
                    // closing the document root: splice our elements first
                    if !has_bookkeeping {
                        write_bookkeeping(&mut writer, &http_server, kind, name)?;
                    }
                    write_scripts(
                        &mut writer,
                        &http_server,
                        &prefix,
                        kind,
                        name,
                        pxe_just_once,
                        run_install_triggers,
                    )?;
                }
                write_event(&mut writer, Event::End(e))?;
            }
            Ok(Event::Eof) => break,
            Ok(event) => write_event(&mut writer, event)?,
            Err(e) => {
                return Err(ForgeError::Render(format!(
                    "Rendered answer file for {} '{}' is not valid XML: {}",
                    kind, name, e
                )))
            }
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| ForgeError::Render(format!("Answer file is not UTF-8: {}", e)))
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ForgeError::Render(format!("Failed to write XML: {}", e)))
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<()> {
    write_event(writer, Event::Start(BytesStart::new(tag)))?;
    write_event(writer, Event::Text(BytesText::new(text)))?;
    write_event(writer, Event::End(BytesEnd::new(tag)))
}

fn write_bookkeeping(
    writer: &mut Writer<Vec<u8>>,
    http_server: &str,
    kind: ItemKind,
    name: &str,
) -> Result<()> {
    write_event(writer, Event::Start(BytesStart::new("bootforge")))?;
    write_text_element(writer, "server", http_server)?;
    match kind {
        ItemKind::System => write_text_element(writer, "system_name", name)?,
        _ => write_text_element(writer, "profile_name", name)?,
    }
    write_event(writer, Event::End(BytesEnd::new("bootforge")))
}

fn write_scripts(
    writer: &mut Writer<Vec<u8>>,
    http_server: &str,
    prefix: &str,
    kind: ItemKind,
    name: &str,
    pxe_just_once: bool,
    run_install_triggers: bool,
) -> Result<()> {
    if !pxe_just_once && !run_install_triggers {
        return Ok(());
    }

    let mut scripts = BytesStart::new("scripts");
    scripts.push_attribute(("config:type", "list"));
    write_event(writer, Event::Start(scripts))?;

    if pxe_just_once {
        let source = format!(
            "curl \"http://{}/{}/op/nopxe/system/{}\" > /dev/null",
            http_server, prefix, name
        );
        write_script_group(writer, "chroot-scripts", "disable_netboot", &source)?;
    }
    if run_install_triggers {
        let pre = format!(
            "curl \"http://{}/{}/op/trig/mode/pre/{}/{}\" > /dev/null",
            http_server, prefix, kind, name
        );
        let post = format!(
            "curl \"http://{}/{}/op/trig/mode/post/{}/{}\" > /dev/null",
            http_server, prefix, kind, name
        );
        write_script_group(writer, "pre-scripts", "install_start", &pre)?;
        write_script_group(writer, "init-scripts", "install_finished", &post)?;
    }

    write_event(writer, Event::End(BytesEnd::new("scripts")))
}

fn write_script_group(
    writer: &mut Writer<Vec<u8>>,
    group: &str,
    filename: &str,
    source: &str,
) -> Result<()> {
    write_event(writer, Event::Start(BytesStart::new(group)))?;
    write_event(writer, Event::Start(BytesStart::new("script")))?;
    write_text_element(writer, "filename", filename)?;
    write_event(writer, Event::Start(BytesStart::new("source")))?;
    write_event(writer, Event::CData(BytesCData::new(source)))?;
    write_event(writer, Event::End(BytesEnd::new("source")))?;
    write_event(writer, Event::End(BytesEnd::new("script")))?;
    write_event(writer, Event::End(BytesEnd::new(group)))
}
