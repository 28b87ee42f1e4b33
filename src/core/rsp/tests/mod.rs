// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! RSP pipeline tests
//!
//! Tests are organized into the following modules:
//! - `matrix`: Matrix command decoding, stack depth bounds, MVP caching
//! - `lighting`: Directional/positional lights and look-at projection
//! - `vertex`: Vertex transform, clip codes, texture coordinates and fog
