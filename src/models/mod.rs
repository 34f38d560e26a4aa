// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod document;
pub mod error;
pub mod health;
pub mod search;
pub mod version;
