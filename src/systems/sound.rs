//! Sound start/end notification.

use mlua::prelude::*;

use crate::error::EngineResult;
use crate::resources::lua_runtime::SoundProxy;

/// Forward pending start/end transitions of the stage's sounds to their
/// `on_start` / `on_end` handlers.
///
/// Each transition is delivered once; the handler receives the sound handle.
pub fn dispatch_sounds(sounds: &[LuaAnyUserData]) -> EngineResult<()> {
    for ud in sounds {
        let (start, end) = {
            let proxy = ud.borrow::<SoundProxy>()?;
            let fx = proxy.fx();
            let start = fx.take_started().then(|| proxy.on_start().cloned()).flatten();
            let end = fx.take_ended().then(|| proxy.on_end().cloned()).flatten();
            (start, end)
        };
        if let Some(handler) = start {
            handler.call::<()>(ud.clone())?;
        }
        if let Some(handler) = end {
            handler.call::<()>(ud.clone())?;
        }
    }
    Ok(())
}
