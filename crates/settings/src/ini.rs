// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! INI file store.
//!
//! The file is also edited by other processes (the VNC server writes its own
//! password and port into it), so the in-process copy is refreshed whenever
//! the file's modification time changes. Layout, comments and unknown lines
//! survive a write.

use std::{
	fs, io,
	path::{Path, PathBuf},
	time::SystemTime,
};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{Settings, SettingsError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
	Section(String),
	Entry {
		key: String,
		value: String,
	},
	/// Comment, blank or unparsable line, kept verbatim.
	Other(String),
}

#[derive(Debug, Default, Clone)]
struct Document {
	lines: Vec<Line>,
}

impl Document {
	fn parse(text: &str) -> Self {
		let lines = text
			.lines()
			.map(|raw| {
				let line = raw.trim();
				if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
					return Line::Other(raw.to_string());
				}
				if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
					return Line::Section(name.trim().to_string());
				}
				match line.split_once('=') {
					Some((key, value)) => Line::Entry {
						key: key.trim().to_string(),
						value: value.trim().to_string(),
					},
					None => Line::Other(raw.to_string()),
				}
			})
			.collect();
		Self {
			lines,
		}
	}

	/// Index range `(header, end)` of the lines belonging to `section`.
	fn section_range(&self, section: &str) -> Option<(usize, usize)> {
		let header = self.lines.iter().position(|line| matches!(line, Line::Section(name) if name == section))?;
		let end = self.lines[header + 1..]
			.iter()
			.position(|line| matches!(line, Line::Section(_)))
			.map_or(self.lines.len(), |offset| header + 1 + offset);
		Some((header, end))
	}

	fn get(&self, section: &str, key: &str) -> Option<&str> {
		let (header, end) = self.section_range(section)?;
		self.lines[header + 1..end].iter().find_map(|line| match line {
			Line::Entry {
				key: k,
				value,
			} if k == key => Some(value.as_str()),
			_ => None,
		})
	}

	fn set(&mut self, section: &str, key: &str, value: &str) {
		let entry = Line::Entry {
			key: key.to_string(),
			value: value.to_string(),
		};

		let Some((header, end)) = self.section_range(section) else {
			if self.lines.last().is_some_and(|line| !matches!(line, Line::Other(raw) if raw.trim().is_empty()))
			{
				self.lines.push(Line::Other(String::new()));
			}
			self.lines.push(Line::Section(section.to_string()));
			self.lines.push(entry);
			return;
		};

		let mut last_entry = header;
		for index in header + 1..end {
			if let Line::Entry {
				key: k,
				value: v,
			} = &mut self.lines[index]
			{
				if k.as_str() == key {
					*v = value.to_string();
					return;
				}
				last_entry = index;
			}
		}
		self.lines.insert(last_entry + 1, entry);
	}

	fn render(&self) -> String {
		let mut out = String::new();
		for line in &self.lines {
			match line {
				Line::Section(name) => {
					out.push('[');
					out.push_str(name);
					out.push(']');
				}
				Line::Entry {
					key,
					value,
				} => {
					out.push_str(key);
					out.push('=');
					out.push_str(value);
				}
				Line::Other(raw) => out.push_str(raw),
			}
			out.push('\n');
		}
		out
	}
}

struct Cache {
	document: Document,
	/// Modification time of the file when it was last read or written.
	modified: Option<SystemTime>,
}

/// Settings backed by an INI file, or held in memory only.
pub struct IniFile {
	path: Option<PathBuf>,
	cache: RwLock<Cache>,
}

impl IniFile {
	/// Open the file at `path`. A missing file reads as empty and is created
	/// by the first write.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		let (document, modified) = read_document(&path)?;
		debug!(path = %path.display(), "settings file opened");
		Ok(Self {
			path: Some(path),
			cache: RwLock::new(Cache {
				document,
				modified,
			}),
		})
	}

	/// An in-memory store seeded with INI `text`. Writes are never persisted.
	pub fn in_memory(text: &str) -> Self {
		Self {
			path: None,
			cache: RwLock::new(Cache {
				document: Document::parse(text),
				modified: None,
			}),
		}
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	/// Current content rendered as INI text.
	pub fn render(&self) -> String {
		self.refresh();
		self.cache.read().document.render()
	}

	/// Re-read the file if another process changed it since our last access.
	fn refresh(&self) {
		let Some(path) = &self.path else {
			return;
		};
		let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok();
		if modified == self.cache.read().modified {
			return;
		}

		match read_document(path) {
			Ok((document, modified)) => {
				let mut cache = self.cache.write();
				cache.document = document;
				cache.modified = modified;
				debug!(path = %path.display(), "settings file reloaded");
			}
			Err(err) => warn!(error = %err, "keeping cached settings"),
		}
	}
}

impl Settings for IniFile {
	fn get(&self, section: &str, key: &str) -> Option<String> {
		self.refresh();
		self.cache.read().document.get(section, key).map(str::to_string)
	}

	fn set(&self, section: &str, key: &str, value: &str) -> Result<(), SettingsError> {
		if key.is_empty() || key.contains(['=', '\n', '\r', '[']) {
			return Err(SettingsError::InvalidKey(key.to_string()));
		}
		let value: String = value.chars().filter(|c| *c != '\n' && *c != '\r').collect();

		self.refresh();
		let mut cache = self.cache.write();
		cache.document.set(section, key, &value);

		if let Some(path) = &self.path {
			fs::write(path, cache.document.render()).map_err(|source| SettingsError::Write {
				path: path.clone(),
				source,
			})?;
			cache.modified = fs::metadata(path).and_then(|meta| meta.modified()).ok();
		}
		Ok(())
	}
}

fn read_document(path: &Path) -> Result<(Document, Option<SystemTime>), SettingsError> {
	match fs::read_to_string(path) {
		Ok(text) => {
			let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok();
			Ok((Document::parse(&text), modified))
		}
		Err(err) if err.kind() == io::ErrorKind::NotFound => Ok((Document::default(), None)),
		Err(source) => Err(SettingsError::Read {
			path: path.to_path_buf(),
			source,
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = "; VNC settings\n[admin]\nPortNumber=5901\nUseRegistry = 0\n\n[ultravnc]\npasswd=0011223344556677\n";

	#[test]
	fn test_get() {
		let ini = IniFile::in_memory(SAMPLE);
		assert_eq!(ini.get("admin", "PortNumber").as_deref(), Some("5901"));
		assert_eq!(ini.get("admin", "UseRegistry").as_deref(), Some("0"));
		assert_eq!(ini.get_int("admin", "PortNumber"), Some(5901));
		assert_eq!(ini.get("ultravnc", "passwd").as_deref(), Some("0011223344556677"));
		assert_eq!(ini.get("ultravnc", "passwd2"), None);
		assert_eq!(ini.get("missing", "PortNumber"), None);
	}

	#[test]
	fn test_keys_are_case_sensitive() {
		let ini = IniFile::in_memory(SAMPLE);
		assert_eq!(ini.get("admin", "portnumber"), None);
		assert_eq!(ini.get("Admin", "PortNumber"), None);
	}

	#[test]
	fn test_set_replaces_in_place() {
		let ini = IniFile::in_memory(SAMPLE);
		ini.set("admin", "PortNumber", "5902").unwrap();
		assert_eq!(ini.render(), SAMPLE.replace("5901", "5902").replace("UseRegistry = 0", "UseRegistry=0"));
	}

	#[test]
	fn test_set_appends_to_section() {
		let ini = IniFile::in_memory(SAMPLE);
		ini.set("admin", "Extra", "1").unwrap();
		assert_eq!(
			ini.render(),
			"; VNC settings\n[admin]\nPortNumber=5901\nUseRegistry=0\nExtra=1\n\n[ultravnc]\npasswd=0011223344556677\n"
		);
	}

	#[test]
	fn test_set_creates_section() {
		let ini = IniFile::in_memory(SAMPLE);
		ini.set("VNCManager", "MgrHttpPort", "18480").unwrap();
		assert_eq!(ini.get_int("VNCManager", "MgrHttpPort"), Some(18480));
		assert!(ini.render().ends_with("passwd=0011223344556677\n\n[VNCManager]\nMgrHttpPort=18480\n"));
	}

	#[test]
	fn test_set_rejects_invalid_key() {
		let ini = IniFile::in_memory("");
		assert!(matches!(ini.set("admin", "", "1"), Err(SettingsError::InvalidKey(_))));
		assert!(matches!(ini.set("admin", "a=b", "1"), Err(SettingsError::InvalidKey(_))));
	}

	#[test]
	fn test_get_int_or() {
		let ini = IniFile::in_memory("[admin]\nPortNumber=abc\n");
		assert_eq!(ini.get_int("admin", "PortNumber"), None);
		assert_eq!(ini.get_int_or("admin", "PortNumber", 5900), 5900);
	}
}
