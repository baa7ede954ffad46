use wasm_encoder::{
    CodeSection, ExportKind, ExportSection, Function, FunctionSection, ImportSection, Instruction,
    Module, RefType, TableType, TypeSection, ValType,
};

use super::abi::{
    CALLBACK_TABLE_INDEX, EXPORT_TRAMPOLINE_FN, IMPORT_CALLBACK_TABLE, IMPORT_MODULE,
    TRAMPOLINE_FUNC_INDEX, TY_CALLBACK, TY_TRAMPOLINE,
};

/// Encodes the trampoline module.
///
/// ```text
/// (module
///   (type $cb (func (param i32) (result i32)))
///   (type $tramp (func (param i32 i32) (result i32)))
///   (import "env" "callbacks" (table 0 funcref))
///   (func (export "trampoline") (type $tramp)
///     local.get 1
///     local.get 0
///     call_indirect (type $cb)))
/// ```
///
/// The output is identical on every call; callers encode it once and compile it many times.
#[must_use]
pub fn encode_trampoline() -> Vec<u8> {
    let mut module = Module::new();

    let mut types = TypeSection::new();
    debug_assert_eq!(types.len(), TY_CALLBACK);
    types.ty().function([ValType::I32], [ValType::I32]);
    debug_assert_eq!(types.len(), TY_TRAMPOLINE);
    types.ty().function([ValType::I32, ValType::I32], [ValType::I32]);
    module.section(&types);

    let mut imports = ImportSection::new();
    imports.import(
        IMPORT_MODULE,
        IMPORT_CALLBACK_TABLE,
        TableType {
            element_type: RefType::FUNCREF,
            table64: false,
            minimum: 0,
            maximum: None,
            shared: false,
        },
    );
    module.section(&imports);

    let mut functions = FunctionSection::new();
    functions.function(TY_TRAMPOLINE);
    module.section(&functions);

    let mut exports = ExportSection::new();
    exports.export(EXPORT_TRAMPOLINE_FN, ExportKind::Func, TRAMPOLINE_FUNC_INDEX);
    module.section(&exports);

    let mut func = Function::new(Vec::new());
    func.instruction(&Instruction::LocalGet(1));
    func.instruction(&Instruction::LocalGet(0));
    func.instruction(&Instruction::CallIndirect {
        type_index: TY_CALLBACK,
        table_index: CALLBACK_TABLE_INDEX,
    });
    func.instruction(&Instruction::End);

    let mut code = CodeSection::new();
    code.function(&func);
    module.section(&code);

    module.finish()
}
