// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

mod commit;
mod entry;
mod provider;
mod range;

pub use commit::*;
pub use entry::*;
pub use provider::*;
pub use range::*;
