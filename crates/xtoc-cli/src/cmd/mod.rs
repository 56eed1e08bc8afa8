// SPDX-License-Identifier: Apache-2.0
//! One module per subcommand.

pub mod decode;
pub mod import;
pub mod keygen;
