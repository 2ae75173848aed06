/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Diesel table definitions for the content repository schema.

diesel::table! {
    packages (id) {
        id -> BigInt,
        name -> Text,
        title -> Text,
        content -> Text,
        excerpt -> Text,
        status -> Text,
        package_type -> Text,
        author_id -> Nullable<BigInt>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    package_meta (id) {
        id -> BigInt,
        package_id -> BigInt,
        meta_key -> Text,
        meta_value -> Text,
    }
}

diesel::table! {
    terms (id) {
        id -> BigInt,
        name -> Text,
        slug -> Text,
        kind -> Text,
    }
}

diesel::table! {
    package_terms (package_id, term_id) {
        package_id -> BigInt,
        term_id -> BigInt,
    }
}

diesel::joinable!(package_meta -> packages (package_id));
diesel::joinable!(package_terms -> packages (package_id));
diesel::joinable!(package_terms -> terms (term_id));

diesel::allow_tables_to_appear_in_same_query!(packages, package_meta, terms, package_terms,);
