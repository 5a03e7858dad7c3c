//! Dynamic stand-ins for interfaces
//!
//! A [`DynamicStandIn`] implements an interface by forwarding every method
//! call to a single [`InvocationHandler`]. The forwarding impl is generated
//! once per interface with [`forward_interface!`](crate::forward_interface),
//! after which a [`ProxyFactory`] can register that interface in a container
//! even though no concrete implementing type exists.
//!
//! # Example
//!
//! ```rust
//! use bean_container::{forward_interface, Container, ProxyFactory, Value};
//! use std::sync::Arc;
//!
//! pub trait Fetcher: Send + Sync {
//!     fn query(&self) -> String;
//!     fn fetch(&self, id: u64) -> String;
//! }
//!
//! forward_interface!(Fetcher {
//!     fn query(&self) -> String;
//!     fn fetch(&self, id: u64) -> String;
//! });
//!
//! let handler = |method: &str, _args: Vec<Value>| -> Value {
//!     Box::new(format!("handled:{method}"))
//! };
//!
//! let container = Container::new();
//! container
//!     .register_factory("fetcher", Arc::new(ProxyFactory::<dyn Fetcher>::new(handler).prototype()))
//!     .unwrap();
//!
//! let fetcher = container.get_named::<dyn Fetcher>("fetcher").unwrap();
//! assert_eq!(fetcher.query(), "handled:query");
//! assert_eq!(fetcher.fetch(7), "handled:fetch");
//! ```

use crate::{DiError, Instance, ObjectFactory, Result, TypeKey};
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// A dynamically typed argument or return value
pub type Value = Box<dyn Any + Send + Sync>;

/// Receives every call made against a dynamic stand-in.
pub trait InvocationHandler: Send + Sync {
    /// Handle a call to `method` with the boxed arguments.
    fn dispatch(&self, method: &str, args: Vec<Value>) -> Value;
}

impl<F> InvocationHandler for F
where
    F: Fn(&str, Vec<Value>) -> Value + Send + Sync,
{
    fn dispatch(&self, method: &str, args: Vec<Value>) -> Value {
        self(method, args)
    }
}

/// Forwarding wrapper that implements interfaces through a handler.
pub struct DynamicStandIn {
    interface: TypeKey,
    handler: Arc<dyn InvocationHandler>,
}

impl DynamicStandIn {
    /// Create a stand-in for `interface`.
    #[inline]
    pub fn new(interface: TypeKey, handler: Arc<dyn InvocationHandler>) -> Self {
        Self { interface, handler }
    }

    /// The interface this stand-in was produced for.
    #[inline]
    pub fn interface(&self) -> TypeKey {
        self.interface
    }

    /// Dispatch a call and return the handler's value unchecked.
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Value {
        #[cfg(feature = "logging")]
        trace!(
            target: crate::logging::TARGET,
            interface = self.interface.name(),
            method = method,
            arg_count = args.len(),
            "Dispatching stand-in call"
        );

        self.handler.dispatch(method, args)
    }

    /// Dispatch a call and downcast the result to `R`.
    ///
    /// Unit-returning methods discard whatever the handler returns.
    pub fn try_forward<R: 'static>(&self, method: &str, args: Vec<Value>) -> Result<R> {
        let value = self.invoke(method, args);
        let value: Value = if TypeId::of::<R>() == TypeId::of::<()>() {
            Box::new(())
        } else {
            value
        };

        value
            .downcast::<R>()
            .map(|boxed| *boxed)
            .map_err(|_| DiError::ReturnTypeMismatch {
                method: method.to_string(),
                expected: std::any::type_name::<R>(),
            })
    }

    /// Like [`try_forward`](Self::try_forward) for methods whose signature
    /// cannot carry an error.
    ///
    /// # Panics
    ///
    /// Panics if the handler returns a value of the wrong type.
    #[track_caller]
    pub fn forward<R: 'static>(&self, method: &str, args: Vec<Value>) -> R {
        match self.try_forward(method, args) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl std::fmt::Debug for DynamicStandIn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicStandIn")
            .field("interface", &self.interface)
            .finish()
    }
}

/// An interface type that a [`DynamicStandIn`] can be viewed as.
///
/// Implemented for `dyn Trait` by [`forward_interface!`](crate::forward_interface).
pub trait ProxyTarget: Send + Sync + 'static {
    /// Coerce a stand-in into the interface.
    fn from_stand_in(stand_in: Arc<DynamicStandIn>) -> Arc<Self>;
}

/// Factory that produces dynamic stand-ins for the interface `I`.
pub struct ProxyFactory<I: ?Sized> {
    handler: Arc<dyn InvocationHandler>,
    singleton: bool,
    _interface: PhantomData<fn() -> Arc<I>>,
}

impl<I: ProxyTarget + ?Sized> ProxyFactory<I> {
    /// Create a singleton factory around `handler`.
    #[inline]
    pub fn new<H: InvocationHandler + 'static>(handler: H) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    /// Create a singleton factory around a shared handler.
    #[inline]
    pub fn from_arc(handler: Arc<dyn InvocationHandler>) -> Self {
        Self {
            handler,
            singleton: true,
            _interface: PhantomData,
        }
    }

    /// Produce a fresh stand-in on every resolve.
    #[inline]
    pub fn prototype(mut self) -> Self {
        self.singleton = false;
        self
    }
}

impl<I: ProxyTarget + ?Sized> ObjectFactory for ProxyFactory<I> {
    fn produce(&self) -> Result<Instance> {
        let stand_in = Arc::new(DynamicStandIn::new(
            TypeKey::of::<I>(),
            Arc::clone(&self.handler),
        ));
        Ok(Instance::from_arc(I::from_stand_in(stand_in)))
    }

    #[inline]
    fn produced_type(&self) -> TypeKey {
        TypeKey::of::<I>()
    }

    #[inline]
    fn is_singleton(&self) -> bool {
        self.singleton
    }
}

/// Implement an interface for [`DynamicStandIn`] by forwarding every method
/// to its handler, and make `dyn Interface` a [`ProxyTarget`].
///
/// The trait must be in scope, have `Send + Sync` as supertraits, and list
/// methods taking `&self` and owned `'static` arguments. Each argument is
/// boxed into a [`Value`] in declaration order; the method name is passed
/// as written. Methods without a return type discard the handler's value.
#[macro_export]
macro_rules! forward_interface {
    (@methods) => {};

    (@methods fn $method:ident(&self $(, $arg:ident : $ty:ty)* $(,)?); $($rest:tt)*) => {
        fn $method(&self $(, $arg: $ty)*) {
            self.forward::<()>(
                stringify!($method),
                vec![$(Box::new($arg) as $crate::Value),*],
            )
        }

        $crate::forward_interface!(@methods $($rest)*);
    };

    (@methods fn $method:ident(&self $(, $arg:ident : $ty:ty)* $(,)?) -> $ret:ty; $($rest:tt)*) => {
        fn $method(&self $(, $arg: $ty)*) -> $ret {
            self.forward::<$ret>(
                stringify!($method),
                vec![$(Box::new($arg) as $crate::Value),*],
            )
        }

        $crate::forward_interface!(@methods $($rest)*);
    };

    ($iface:ident { $($methods:tt)* }) => {
        impl $iface for $crate::DynamicStandIn {
            $crate::forward_interface!(@methods $($methods)*);
        }

        impl $crate::ProxyTarget for dyn $iface {
            fn from_stand_in(
                stand_in: ::std::sync::Arc<$crate::DynamicStandIn>,
            ) -> ::std::sync::Arc<Self> {
                stand_in
            }
        }
    };
}
