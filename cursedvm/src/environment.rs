//! Host-visible bindings: the string-keyed environment map plus the Ext
//! handle table that backs property access on `Ext` bases (spec §3, §4.2).
//!
//! A [`Binding`] is the closed set of shapes a host value can take once it
//! crosses into the VM: a coercible scalar, a string, or a callable. This is
//! additive structure spec.md leaves abstract ("arbitrary host handles");
//! see `SPEC_FULL.md`'s supplemented-features note 3.

use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// The two call shapes `b`'s external-call path distinguishes at runtime
/// (spec §4.2): a declared function with fixed arity, or an ordinary
/// callable whose argument count is read off the data stack.
#[derive(Clone)]
pub struct HostFunction {
    /// `Some(n)`: declared with fixed arity `n`, called with raw `Value`
    /// arguments. `None`: ordinary callable, called with marshalled
    /// [`HostArg`]s and an explicit argument count popped from the stack.
    pub arity: Option<usize>,
    callable: Rc<dyn Fn(&[HostArg]) -> Option<Binding>>,
}

impl HostFunction {
    /// Declare a fixed-arity host function.
    pub fn declared(arity: usize, f: impl Fn(&[HostArg]) -> Option<Binding> + 'static) -> Self {
        Self { arity: Some(arity), callable: Rc::new(f) }
    }

    /// Declare an ordinary host callable (stack-counted arity).
    pub fn ordinary(f: impl Fn(&[HostArg]) -> Option<Binding> + 'static) -> Self {
        Self { arity: None, callable: Rc::new(f) }
    }

    /// Invoke the callable with already-marshalled arguments.
    pub fn call(&self, args: &[HostArg]) -> Option<Binding> {
        (self.callable)(args)
    }
}

impl std::fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFunction").field("arity", &self.arity).finish_non_exhaustive()
    }
}

/// An argument handed to a [`HostFunction`]. Fixed-arity calls pass raw
/// [`Value`]s; ordinary calls marshal `Ptr` to `Str` and `Int`/`Float` to
/// `Scalar` before invoking (spec §4.2's "ordinary host callable").
#[derive(Debug, Clone)]
pub enum HostArg {
    /// An unmarshalled `Value`, passed through verbatim.
    Value(Value),
    /// A marshalled numeric argument.
    Scalar(f32),
    /// A marshalled string argument, read from a `Ptr` through word memory.
    Str(String),
}

/// The closed set of shapes a host-visible value can take.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A value coercible to `f32` without any further lookup.
    Scalar(f32),
    /// A string value (e.g. the result of stringifying a `Ptr` on
    /// `env.set`/`env.setp`).
    Str(String),
    /// A callable, declared via [`Environment::declare_host_function`] or
    /// [`Environment::declare_host_callable`].
    Function(HostFunction),
}

impl Binding {
    /// Coerce to a finite `f32`, as required by `env.get`/`env.getp`.
    /// Returns `None` if this binding cannot be represented as a finite
    /// number (a [`HostFunction`], or a [`Binding::Str`] that doesn't parse).
    pub fn coerce_f32(&self) -> Option<f32> {
        match self {
            Binding::Scalar(v) if v.is_finite() => Some(*v),
            Binding::Scalar(_) => None,
            Binding::Str(s) => s.parse::<f32>().ok().filter(|v| v.is_finite()),
            Binding::Function(_) => None,
        }
    }
}

/// A host object reachable through an `Ext` handle: its own binding (what
/// `env.load`/`env.loadp` wrapped) plus a property map addressed by
/// `env.getp`/`env.loadp`/`env.setp` (spec §4.2's "properties of an Ext
/// base").
#[derive(Debug, Clone, Default)]
pub struct HostObject {
    /// The binding this handle wraps.
    pub binding: Option<Binding>,
    /// Properties readable/writable through this handle.
    pub props: HashMap<String, Binding>,
}

impl HostObject {
    fn wrapping(binding: Binding) -> Self {
        Self { binding: Some(binding), props: HashMap::new() }
    }
}

/// The string-keyed global environment map plus the table of live `Ext`
/// handles.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Binding>,
    ext_table: Vec<HostObject>,
}

impl Environment {
    /// An empty environment with no bindings and no live `Ext` handles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite a top-level binding.
    pub fn set(&mut self, key: impl Into<String>, value: Binding) {
        self.bindings.insert(key.into(), value);
    }

    /// Look up a top-level binding.
    pub fn get(&self, key: &str) -> Option<&Binding> {
        self.bindings.get(key)
    }

    /// Register a fixed-arity host function under `name`.
    pub fn declare_host_function(
        &mut self,
        name: impl Into<String>,
        arity: usize,
        f: impl Fn(&[HostArg]) -> Option<Binding> + 'static,
    ) {
        self.set(name, Binding::Function(HostFunction::declared(arity, f)));
    }

    /// Register an ordinary (stack-counted-arity) host callable under
    /// `name`.
    pub fn declare_host_callable(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[HostArg]) -> Option<Binding> + 'static,
    ) {
        self.set(name, Binding::Function(HostFunction::ordinary(f)));
    }

    /// Wrap `binding` in a fresh `Ext` handle and return its index.
    pub fn wrap_ext(&mut self, binding: Binding) -> u32 {
        let handle = self.ext_table.len() as u32;
        self.ext_table.push(HostObject::wrapping(binding));
        handle
    }

    /// Fetch the host object a live `Ext` handle refers to.
    pub fn ext(&self, handle: u32) -> Option<&HostObject> {
        self.ext_table.get(handle as usize)
    }

    /// Fetch a mutable reference to the host object a live `Ext` handle
    /// refers to.
    pub fn ext_mut(&mut self, handle: u32) -> Option<&mut HostObject> {
        self.ext_table.get_mut(handle as usize)
    }

    /// Resolve a call target handle (a top-level binding's `Ext` wrapper or
    /// a handle returned from a prior call) to the [`HostFunction`] it
    /// names, if it is callable.
    pub fn function_at(&self, handle: u32) -> Option<&HostFunction> {
        match self.ext(handle)?.binding.as_ref()? {
            Binding::Function(f) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_binding_coerces_directly() {
        assert_eq!(Binding::Scalar(4.5).coerce_f32(), Some(4.5));
    }

    #[test]
    fn str_binding_parses_when_numeric() {
        assert_eq!(Binding::Str("3.25".into()).coerce_f32(), Some(3.25));
        assert_eq!(Binding::Str("nope".into()).coerce_f32(), None);
    }

    #[test]
    fn function_binding_never_coerces() {
        let f = HostFunction::declared(1, |_| None);
        assert_eq!(Binding::Function(f).coerce_f32(), None);
    }

    #[test]
    fn wrap_ext_then_resolve_function() {
        let mut env = Environment::new();
        env.declare_host_function("id", 1, |args| match args.first() {
            Some(HostArg::Value(v)) => Some(Binding::Scalar(match v {
                Value::Int(i) => *i as f32,
                _ => 0.0,
            })),
            _ => None,
        });
        let handle = match env.get("id").unwrap() {
            Binding::Function(f) => f.clone(),
            _ => panic!("expected function"),
        };
        let ext = env.wrap_ext(Binding::Function(handle));
        let f = env.function_at(ext).unwrap();
        assert_eq!(f.arity, Some(1));
        let result = f.call(&[HostArg::Value(Value::Int(7))]);
        assert!(matches!(result, Some(Binding::Scalar(v)) if v == 7.0));
    }

    #[test]
    fn properties_are_scoped_to_their_ext_handle() {
        let mut env = Environment::new();
        let a = env.wrap_ext(Binding::Scalar(1.0));
        let b = env.wrap_ext(Binding::Scalar(2.0));
        env.ext_mut(a).unwrap().props.insert("x".into(), Binding::Scalar(10.0));
        assert!(env.ext(b).unwrap().props.get("x").is_none());
        assert_eq!(env.ext(a).unwrap().props.get("x").unwrap().coerce_f32(), Some(10.0));
    }
}
