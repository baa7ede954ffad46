use wasmtime::{
    Config, Engine, Func, Instance, Module, Ref, RefType, Store, Table, TableType, TypedFunc,
};

use thiserror::Error;

use crate::callback::{Abort, Callback};
use crate::wasm::{encode_trampoline, EXPORT_TRAMPOLINE_FN};

/// Failures of the code-generation backend.
///
/// None of these are expected on a working host; callers treat them as fatal.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("create wasmtime engine: {0}")]
    Engine(wasmtime::Error),

    #[error("compile trampoline module: {0}")]
    Compile(wasmtime::Error),

    #[error("instantiate trampoline module: {0}")]
    Instantiate(wasmtime::Error),

    #[error("resolve export `{name}`: {err}")]
    Resolve {
        name: &'static str,
        err: wasmtime::Error,
    },

    #[error("install callback into unit table: {0}")]
    InstallCallback(wasmtime::Error),

    #[error("callback table is full ({0} entries)")]
    CallbackTableFull(usize),
}

/// Outcome of a call through a [`DynamicUnit`] that did not return a value.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The callback terminated abruptly and the signal unwound out of the generated code.
    #[error(transparent)]
    Abort(#[from] Abort),

    /// The generated code trapped for a reason other than a callback abort.
    #[error("trampoline trapped: {0}")]
    Trap(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// `wasmtime`-powered code generator for trampolines.
///
/// The backend owns the engine and the encoded trampoline description. Both are created once and
/// shared by every thread; each [`JitBackend::create_unit`] call compiles the description again.
pub struct JitBackend {
    engine: Engine,
    trampoline: Vec<u8>,
}

impl JitBackend {
    pub fn new() -> Result<Self, BackendError> {
        let mut config = Config::new();
        // Generated frames must be described to the system unwinder and walkable by the trap
        // machinery; registering that metadata per unit is the cost being measured.
        config.native_unwind_info(true);
        config.wasm_backtrace(true);
        let engine = Engine::new(&config).map_err(BackendError::Engine)?;

        Ok(Self {
            engine,
            trampoline: encode_trampoline(),
        })
    }

    /// The encoded trampoline module every unit is compiled from.
    pub fn trampoline_wasm(&self) -> &[u8] {
        &self.trampoline
    }

    /// Compile, load and instantiate a fresh trampoline.
    pub fn create_unit(&self) -> Result<DynamicUnit, BackendError> {
        DynamicUnit::create(self)
    }
}

/// One independently compiled and loaded trampoline.
///
/// The unit owns its store (instance, callback table, host functions) and its module (machine
/// code + unwind registration). Dropping the unit releases all of it; [`DynamicUnit::destroy`]
/// makes that point explicit at call sites.
pub struct DynamicUnit {
    // Field order is drop order: the store references the module's code.
    store: Store<()>,
    table: Table,
    entry: TypedFunc<(i32, i32), i32>,
    callbacks: Vec<Callback>,
    module: Module,
}

impl DynamicUnit {
    fn create(backend: &JitBackend) -> Result<Self, BackendError> {
        let module =
            Module::new(&backend.engine, &backend.trampoline).map_err(BackendError::Compile)?;

        let mut store = Store::new(&backend.engine, ());
        let table = Table::new(
            &mut store,
            TableType::new(RefType::FUNCREF, 0, None),
            Ref::Func(None),
        )
        .map_err(BackendError::Instantiate)?;
        let instance = Instance::new(&mut store, &module, &[table.into()])
            .map_err(BackendError::Instantiate)?;
        let entry = instance
            .get_typed_func::<(i32, i32), i32>(&mut store, EXPORT_TRAMPOLINE_FN)
            .map_err(|err| BackendError::Resolve {
                name: EXPORT_TRAMPOLINE_FN,
                err,
            })?;

        tracing::trace!(
            code_bytes = image_len(&module),
            "instantiated dynamic unit"
        );

        Ok(Self {
            store,
            table,
            entry,
            callbacks: Vec::new(),
            module,
        })
    }

    /// Call `callback(value)` through the generated trampoline.
    ///
    /// Returns the callback's result when it returns normally, [`InvokeError::Abort`] when it
    /// terminated abruptly, and [`InvokeError::Trap`] for any other trap.
    pub fn invoke(&mut self, callback: Callback, value: i32) -> Result<i32, InvokeError> {
        let slot = self.callback_slot(callback)?;
        match self.entry.call(&mut self.store, (slot, value)) {
            Ok(result) => Ok(result),
            Err(err) => match err.downcast_ref::<Abort>() {
                Some(abort) => Err(InvokeError::Abort(*abort)),
                None => Err(InvokeError::Trap(format!("{err:?}"))),
            },
        }
    }

    /// Number of distinct callbacks installed into this unit's table.
    pub fn installed_callbacks(&self) -> usize {
        self.callbacks.len()
    }

    /// Size in bytes of the unit's loaded code image.
    pub fn code_size(&self) -> usize {
        image_len(&self.module)
    }

    /// Release the compiled code, the instance and the unwind registration.
    pub fn destroy(self) {
        drop(self);
    }

    /// Table index for `callback`, installing it on first use.
    fn callback_slot(&mut self, callback: Callback) -> Result<i32, BackendError> {
        if let Some(slot) = self
            .callbacks
            .iter()
            .position(|&installed| installed as usize == callback as usize)
        {
            return i32::try_from(slot).map_err(|_| BackendError::CallbackTableFull(slot));
        }

        let slot = self.callbacks.len();
        let index = i32::try_from(slot).map_err(|_| BackendError::CallbackTableFull(slot))?;
        let func = Func::wrap(&mut self.store, move |value: i32| -> wasmtime::Result<i32> {
            callback(value).map_err(wasmtime::Error::new)
        });
        self.table
            .grow(&mut self.store, 1, Ref::Func(Some(func)))
            .map_err(BackendError::InstallCallback)?;
        self.callbacks.push(callback);
        Ok(index)
    }
}

fn image_len(module: &Module) -> usize {
    let range = module.image_range();
    range.end as usize - range.start as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(value: i32) -> Result<i32, Abort> {
        Ok(value * 2)
    }

    fn negate(value: i32) -> Result<i32, Abort> {
        Ok(-value)
    }

    fn always_abort(value: i32) -> Result<i32, Abort> {
        Err(Abort { value })
    }

    #[test]
    fn trampoline_forwards_to_callback() {
        let backend = JitBackend::new().unwrap();
        let mut unit = backend.create_unit().unwrap();
        assert_eq!(unit.invoke(double, 21).unwrap(), 42);
        assert_eq!(unit.invoke(negate, 7).unwrap(), -7);
    }

    #[test]
    fn callbacks_get_one_slot_each() {
        let backend = JitBackend::new().unwrap();
        let mut unit = backend.create_unit().unwrap();
        for v in 0..8 {
            unit.invoke(double, v).unwrap();
            unit.invoke(negate, v).unwrap();
        }
        assert_eq!(unit.installed_callbacks(), 2);
    }

    #[test]
    fn abort_payload_survives_unwinding() {
        let backend = JitBackend::new().unwrap();
        let mut unit = backend.create_unit().unwrap();
        match unit.invoke(always_abort, -5) {
            Err(InvokeError::Abort(abort)) => assert_eq!(abort, Abort { value: -5 }),
            other => panic!("expected abort, got {other:?}"),
        }
        // The store stays usable after a trap.
        assert_eq!(unit.invoke(double, 3).unwrap(), 6);
    }

    #[test]
    fn units_have_private_code() {
        let backend = JitBackend::new().unwrap();
        let a = backend.create_unit().unwrap();
        let b = backend.create_unit().unwrap();
        assert!(a.code_size() > 0);
        assert_ne!(a.module.image_range().start, b.module.image_range().start);
        a.destroy();
        b.destroy();
    }
}
