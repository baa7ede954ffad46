/// Module name for all imports required by the trampoline.
pub const IMPORT_MODULE: &str = "env";

/// Imported `funcref` table holding the host callbacks a unit can dispatch to.
///
/// A "callback pointer" passed to the trampoline is an index into this table.
pub const IMPORT_CALLBACK_TABLE: &str = "callbacks";

/// Export name of the trampoline function.
///
/// Signature: `trampoline(callback: i32, value: i32) -> i32`.
pub const EXPORT_TRAMPOLINE_FN: &str = "trampoline";

/// Type index of the callback signature `(i32) -> i32`.
pub const TY_CALLBACK: u32 = 0;

/// Type index of the trampoline signature `(i32, i32) -> i32`.
pub const TY_TRAMPOLINE: u32 = 1;

/// Index of the imported callback table within the module's table index space.
pub const CALLBACK_TABLE_INDEX: u32 = 0;

/// Function index of the trampoline (the module imports no functions).
pub const TRAMPOLINE_FUNC_INDEX: u32 = 0;
