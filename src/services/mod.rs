// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod elasticsearch;
pub mod engine;
pub mod logging;
pub mod normalize;
pub mod query;
pub mod search;
