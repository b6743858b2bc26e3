//! Rewrites a job's XML template: the root `JobName` attribute and the
//! `<StartAddress>` child.

use anyhow::{Context, Result, bail};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use tracing::warn;

pub const EMPTY_TEMPLATE: &str = "<root></root>";
const START_ADDRESS: &[u8] = b"StartAddress";
const JOB_NAME: &[u8] = b"JobName";

/// Patches `template`, falling back to an empty root when it is blank or malformed.
pub fn patch_job_xml(template: &str, job_name: &str, start_address: &str) -> Result<String> {
    if template.trim().is_empty() {
        return patch(EMPTY_TEMPLATE, job_name, start_address);
    }

    match patch(template, job_name, start_address) {
        Ok(xml) => Ok(xml),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "job XML unreadable, using empty template");
            patch(EMPTY_TEMPLATE, job_name, start_address)
        }
    }
}

fn has_start_address(template: &str) -> Result<bool> {
    let mut reader = Reader::from_str(template);
    let mut depth = 0_usize;

    loop {
        match reader.read_event().context("failed to parse job XML")? {
            Event::Start(e) => {
                if depth == 1 && e.name().as_ref() == START_ADDRESS {
                    return Ok(true);
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 1 && e.name().as_ref() == START_ADDRESS {
                    return Ok(true);
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => return Ok(false),
            _ => {}
        }
    }
}

fn patched_root(original: &BytesStart<'_>, job_name: &str) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(original.name().as_ref()).into_owned();
    let mut root = BytesStart::new(name);
    let mut replaced = false;

    for attr in original.attributes() {
        let attr = attr.context("invalid attribute on job XML root")?;
        if attr.key.as_ref() == JOB_NAME {
            root.push_attribute(("JobName", job_name));
            replaced = true;
        } else {
            root.push_attribute(attr);
        }
    }
    if !replaced {
        root.push_attribute(("JobName", job_name));
    }

    Ok(root)
}

fn write_start_address(writer: &mut Writer<Vec<u8>>, value: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("StartAddress")))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("StartAddress")))?;
    Ok(())
}

fn patch(template: &str, job_name: &str, start_address: &str) -> Result<String> {
    let insert_first = !has_start_address(template)?;

    let mut reader = Reader::from_str(template);
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;

    let mut depth = 0_usize;
    let mut seen_root = false;
    let mut replaced = false;
    let mut skipping = false;

    loop {
        match reader.read_event().context("failed to parse job XML")? {
            Event::Decl(_) => {}
            Event::Start(e) => {
                if skipping {
                    depth += 1;
                    continue;
                }
                if depth == 0 {
                    if seen_root {
                        bail!("job XML has more than one root element");
                    }
                    seen_root = true;
                    writer.write_event(Event::Start(patched_root(&e, job_name)?))?;
                    if insert_first {
                        write_start_address(&mut writer, start_address)?;
                        replaced = true;
                    }
                } else if depth == 1 && !replaced && e.name().as_ref() == START_ADDRESS {
                    writer.write_event(Event::Start(e))?;
                    writer.write_event(Event::Text(BytesText::new(start_address)))?;
                    skipping = true;
                } else {
                    writer.write_event(Event::Start(e))?;
                }
                depth += 1;
            }
            Event::End(e) => {
                if depth == 0 {
                    bail!("unbalanced end tag in job XML");
                }
                depth -= 1;
                if skipping {
                    if depth == 1 {
                        skipping = false;
                        replaced = true;
                        writer.write_event(Event::End(e))?;
                    }
                    continue;
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Empty(e) => {
                if skipping {
                    continue;
                }
                if depth == 0 {
                    if seen_root {
                        bail!("job XML has more than one root element");
                    }
                    seen_root = true;
                    let root = patched_root(&e, job_name)?;
                    let end = BytesEnd::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    writer.write_event(Event::Start(root))?;
                    write_start_address(&mut writer, start_address)?;
                    writer.write_event(Event::End(end))?;
                    replaced = true;
                } else if depth == 1 && !replaced && e.name().as_ref() == START_ADDRESS {
                    write_start_address(&mut writer, start_address)?;
                    replaced = true;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::Text(e) => {
                if depth > 0 && !skipping {
                    writer.write_event(Event::Text(e))?;
                }
            }
            Event::Eof => break,
            other => {
                if !skipping {
                    writer.write_event(other)?;
                }
            }
        }
    }

    if !seen_root {
        bail!("job XML has no root element");
    }
    if depth != 0 {
        bail!("job XML ends inside an open element");
    }

    String::from_utf8(writer.into_inner()).context("patched job XML is not UTF-8")
}
