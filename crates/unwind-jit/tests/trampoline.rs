#![cfg(not(target_arch = "wasm32"))]

use std::sync::OnceLock;
use std::thread;

use proptest::prelude::*;
use unwind_jit::wasm::{
    encode_trampoline, EXPORT_TRAMPOLINE_FN, IMPORT_CALLBACK_TABLE, IMPORT_MODULE,
};
use unwind_jit::{Abort, InvokeError, JitBackend};
use wasmparser::{ExternalKind, Parser, Payload, TypeRef, Validator};

fn shared_backend() -> &'static JitBackend {
    static BACKEND: OnceLock<JitBackend> = OnceLock::new();
    BACKEND.get_or_init(|| JitBackend::new().expect("create backend"))
}

fn collatz(value: i32) -> Result<i32, Abort> {
    if value < 1 {
        return Err(Abort { value });
    }
    if value & 1 != 0 {
        Ok(3 * value + 1)
    } else {
        Ok(value / 2)
    }
}

#[test]
fn trampoline_module_validates() {
    let wasm = encode_trampoline();
    Validator::new()
        .validate_all(&wasm)
        .expect("trampoline module must validate");
}

#[test]
fn trampoline_module_imports_only_the_callback_table() {
    let wasm = encode_trampoline();
    let mut imports = Vec::new();
    let mut exports = Vec::new();
    for payload in Parser::new(0).parse_all(&wasm) {
        match payload.expect("parse wasm section") {
            Payload::ImportSection(reader) => {
                for group in reader {
                    let group = group.expect("parse import group");
                    for import in group {
                        let (_offset, import) = import.expect("parse import");
                        assert!(matches!(import.ty, TypeRef::Table(_)));
                        imports.push((import.module.to_string(), import.name.to_string()));
                    }
                }
            }
            Payload::ExportSection(reader) => {
                for export in reader {
                    let export = export.expect("export");
                    assert_eq!(export.kind, ExternalKind::Func);
                    exports.push(export.name.to_string());
                }
            }
            _ => {}
        }
    }
    assert_eq!(
        imports,
        vec![(IMPORT_MODULE.to_string(), IMPORT_CALLBACK_TABLE.to_string())]
    );
    assert_eq!(exports, vec![EXPORT_TRAMPOLINE_FN.to_string()]);
}

#[test]
fn backend_compiles_the_shared_description() {
    let backend = JitBackend::new().expect("create backend");
    assert_eq!(backend.trampoline_wasm(), encode_trampoline().as_slice());
}

#[test]
fn units_can_be_churned_concurrently() {
    let backend = JitBackend::new().expect("create backend");
    thread::scope(|scope| {
        for worker in 0..4 {
            let backend = &backend;
            scope.spawn(move || {
                for pass in 0..8 {
                    let mut unit = backend.create_unit().expect("create unit");
                    let input = worker * 100 + pass + 1;
                    assert_eq!(unit.invoke(collatz, input).unwrap(), collatz(input).unwrap());
                    assert!(matches!(
                        unit.invoke(collatz, -input),
                        Err(InvokeError::Abort(Abort { value })) if value == -input
                    ));
                    unit.destroy();
                }
            });
        }
    });
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        rng_algorithm: proptest::test_runner::RngAlgorithm::ChaCha,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0x7A4B_0001),
        .. ProptestConfig::default()
    })]

    #[test]
    fn positive_inputs_return_the_callback_result(values in proptest::collection::vec(1i32..=0x1_0000, 1..64)) {
        let mut unit = shared_backend().create_unit().expect("create unit");
        for v in values {
            let expected = if v & 1 != 0 { 3 * v + 1 } else { v / 2 };
            prop_assert_eq!(unit.invoke(collatz, v).unwrap(), expected);
        }
    }

    #[test]
    fn non_positive_inputs_always_abort(v in i32::MIN..1) {
        let mut unit = shared_backend().create_unit().expect("create unit");
        match unit.invoke(collatz, v) {
            Err(InvokeError::Abort(abort)) => prop_assert_eq!(abort.value, v),
            other => prop_assert!(false, "expected abort for {}, got {:?}", v, other),
        }
    }
}
