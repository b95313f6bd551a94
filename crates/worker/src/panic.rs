use std::any::Any;

/// Extracts the message from a panic payload when it is a string.
pub fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return Some((*msg).to_owned());
	}
	payload.downcast_ref::<String>().cloned()
}
