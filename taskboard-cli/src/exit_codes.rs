//! Process exit codes

pub const EXIT_SUCCESS: i32 = 0;
/// The command ran but the remote rejected the change and it was rolled back
pub const EXIT_WARNING: i32 = 1;
pub const EXIT_ERROR: i32 = 2;
