//! CLI Exit Code Registry
//!
//! Single source of truth for `vhub` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (database, unexpected failure)     |
//! | 2    | Usage error (bad args, bad pagination)           |
//! | 3    | IO error (unreadable upload, unwritable output)  |
//! | 4    | Rejected upload (not a workbook, no data rows)   |
//! | 5    | File id not found                                |
//! | 6    | Export matched no records                        |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid query values.
pub const EXIT_USAGE: u8 = 2;

/// Upload or output file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// Upload rejected: wrong extension, unreadable workbook, or no data rows.
pub const EXIT_MALFORMED: u8 = 4;

/// Referenced file id does not exist.
pub const EXIT_NOT_FOUND: u8 = 5;

/// Export filters matched nothing.
pub const EXIT_NO_DATA: u8 = 6;
