use std::any::Any;
use std::sync::Arc;

/// A resolved service value, shared across every instance it is injected
/// into. Consumers downcast to the concrete type they registered.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Capability: receive declared services once wiring reaches the injection
/// step. Values arrive positionally, in declared token order; unknown tokens
/// arrive as `None`.
pub trait OnInject {
	fn on_inject(&mut self, services: Vec<Option<Service>>);
}

/// Capability: notified once the instance is fully wired.
pub trait OnReady {
	fn on_ready(&mut self);
}

/// Capability: notified on every host window resize for the instance's
/// lifetime.
pub trait OnResize {
	fn on_resize(&mut self);
}

/// Capability: notified when the bound element leaves the document, before
/// internal references are cleared.
pub trait OnDestroy {
	fn on_destroy(&mut self);
}

/// A component object. Every hook is optional; a component opts in by
/// implementing the capability trait and overriding the matching cast.
///
/// ```
/// use weft_registry::{Component, OnReady};
///
/// struct Banner;
///
/// impl OnReady for Banner {
/// 	fn on_ready(&mut self) {}
/// }
///
/// impl Component for Banner {
/// 	fn as_ready(&mut self) -> Option<&mut dyn OnReady> {
/// 		Some(self)
/// 	}
/// }
/// ```
pub trait Component: Send {
	fn as_inject(&mut self) -> Option<&mut dyn OnInject> {
		None
	}

	fn as_ready(&mut self) -> Option<&mut dyn OnReady> {
		None
	}

	fn as_resize(&mut self) -> Option<&mut dyn OnResize> {
		None
	}

	fn as_destroy(&mut self) -> Option<&mut dyn OnDestroy> {
		None
	}
}
