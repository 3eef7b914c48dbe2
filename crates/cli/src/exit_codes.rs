//! CLI Exit Code Registry
//!
//! Single source of truth for exit codes. Exit codes are part of the shell
//! contract — scripts rely on them. Clap itself exits 2 on usage errors.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// IO error - unreadable input file, unparseable workbook, unwritable output.
pub const EXIT_IO: u8 = 3;

/// Key column error - the named join-key column is absent, or an input
/// carries a stray column under the reserved key name.
pub const EXIT_KEY_COLUMN: u8 = 4;

/// No matching rows - filtering left nothing of the first file.
pub const EXIT_NO_MATCH: u8 = 5;
