// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for type safety across walletscope.
//!
//! This module provides newtype wrappers for domain concepts:
//! - Wei amounts and their ether rendering

pub mod wei;

// Note: Public types are re-exported from lib.rs, not here
