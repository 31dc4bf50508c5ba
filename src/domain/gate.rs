//! Entry policy applied to breakout signals before the driver sees them.
//!
//! A gate only ever suppresses an entry; it never creates one and never
//! affects orders already in flight.

/// Decides whether a breakout may open a position.
pub trait EntryGate: Send {
    /// `breakout` is the ADBreakout edge (+1/-1/0); `td_count` is the TD
    /// Sequential count on the same bar, `None` during its warm-up.
    fn allows(&self, breakout: i8, td_count: Option<i32>) -> bool;
}

/// Lets every breakout through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl EntryGate for AllowAll {
    fn allows(&self, breakout: i8, _td_count: Option<i32>) -> bool {
        breakout != 0
    }
}

/// Filters entries on the exhaustion count.
///
/// With `max_abs_count` set, a breakout is only taken while |td_count| is at
/// most that value, so late entries into an extended run are skipped. With
/// `require_agreement`, the count must point the same way as the breakout.
/// An invalid count never satisfies either condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TdCountGate {
    pub max_abs_count: Option<u32>,
    pub require_agreement: bool,
}

impl TdCountGate {
    /// Build from the config convention where a negative bound means none.
    pub fn from_config(max_entry_td: i64, require_agreement: bool) -> Self {
        Self {
            max_abs_count: u32::try_from(max_entry_td).ok(),
            require_agreement,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.max_abs_count.is_none() && !self.require_agreement
    }
}

impl EntryGate for TdCountGate {
    fn allows(&self, breakout: i8, td_count: Option<i32>) -> bool {
        if breakout == 0 {
            return false;
        }
        if self.is_unrestricted() {
            return true;
        }
        let Some(count) = td_count else {
            return false;
        };
        if let Some(max) = self.max_abs_count {
            if count.unsigned_abs() > max {
                return false;
            }
        }
        if self.require_agreement && count.signum() != i32::from(breakout.signum()) {
            return false;
        }
        true
    }
}
