// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Sections and keys of `vnc.ini`.

/// File name of the settings file next to the executable.
pub const INI_FILE_NAME: &str = "vnc.ini";

pub const SECTION_ADMIN: &str = "admin";
pub const SECTION_ULTRAVNC: &str = "ultravnc";
pub const SECTION_MANAGER: &str = "VNCManager";

/// Port the VNC server listens on.
pub const PORT_NUMBER: &str = "PortNumber";
/// Full access password, obfuscated.
pub const PASSWD: &str = "passwd";
/// View only password, obfuscated.
pub const PASSWD2: &str = "passwd2";

pub const LOG_LEVEL: &str = "LogLevel";
pub const MGR_HTTP_PORT: &str = "MgrHttpPort";
pub const PLT_UUID: &str = "PltUuid";
pub const PLT_ADDR: &str = "PltAddr";
pub const UPDATE_PATH: &str = "UpdatePath";

pub const DEFAULT_VNC_PORT: i64 = 5900;
pub const DEFAULT_HTTP_PORT: i64 = 18480;
