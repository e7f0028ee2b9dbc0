//! Derive macros for the supercell particle kernels.
//!
//! This crate provides the [`Species`] derive. It is re-exported from the main
//! `supercell` crate; you don't need to add this crate directly:
//!
//! ```ignore
//! use supercell::prelude::*;
//!
//! #[derive(Species, Clone, Copy)]
//! #[species(super_cell = [8, 8, 4], charge = -1.0, mass = 1.0)]
//! struct Electron {
//!     local_cell_idx: u32,
//!     weighting: f32,
//!     momentum: Vec3,
//! }
//! ```
//!
//! # Identifiers
//!
//! Fields named after a built-in identifier bind it:
//!
//! | Field | Type | Identifier |
//! |-------|------|------------|
//! | `local_cell_idx` | `u32` | `LocalCellIdx` (required) |
//! | `weighting` | `f32` | `Weighting` (required) |
//! | `charge_state` | `f32` | `ChargeState` |
//! | `momentum` | `Vec3` | `Momentum` |
//!
//! Every built-in identifier gets a `HasIdentifier` impl, with flag `Present`
//! or `Absent`. Other identifiers are bound with `#[identifier(Path)]`.
//!
//! # GPU Memory Layout
//!
//! WGSL has strict alignment requirements that differ from Rust. The macro
//! generates a `{Name}Gpu` struct with explicit padding fields so that its
//! layout matches the generated WGSL struct:
//!
//! - `Vec3` requires 16-byte alignment (despite being 12 bytes)
//! - Struct total size is a multiple of 16 bytes
//! - Padding fields are named `_pad0`, `_pad1`, etc.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Expr, ExprArray, Fields, Ident, LitStr, Type};

/// Built-in identifiers bound by field name.
const BUILTIN_IDENTIFIERS: &[(&str, &str)] = &[
    ("local_cell_idx", "LocalCellIdx"),
    ("weighting", "Weighting"),
    ("charge_state", "ChargeState"),
    ("momentum", "Momentum"),
];

/// Derive macro for particle species.
///
/// # Species Attribute
///
/// | Key | Value | Purpose |
/// |-----|-------|---------|
/// | `super_cell` | `[x]`, `[x, y]` or `[x, y, z]` | Cells per supercell axis; the length fixes the dimension |
/// | `charge` | float | Charge of a macro-particle with weighting 1 |
/// | `mass` | float | Mass of a macro-particle with weighting 1 (default 1.0) |
/// | `name` | string | Species name (default: struct name) |
///
/// # Field Attributes
///
/// - `#[mask]` on a `u32` field: the slot is valid when the field is non-zero.
///   Without a mask field every particle is valid.
/// - `#[identifier(Path)]` binds a custom identifier to the field.
///
/// # Supported Types
///
/// | Rust Type | WGSL Type | Size | Alignment |
/// |-----------|-----------|------|-----------|
/// | `Vec3` | `vec3<f32>` | 12 bytes | 16 bytes |
/// | `Vec2` | `vec2<f32>` | 8 bytes | 8 bytes |
/// | `Vec4` | `vec4<f32>` | 16 bytes | 16 bytes |
/// | `f32` | `f32` | 4 bytes | 4 bytes |
/// | `u32` | `u32` | 4 bytes | 4 bytes |
/// | `i32` | `i32` | 4 bytes | 4 bytes |
///
/// # Panics
///
/// The macro panics at compile time if:
/// - Applied to an enum or a tuple struct
/// - The `species` attribute or its `super_cell`/`charge` key is missing
/// - `local_cell_idx: u32` or `weighting: f32` is missing
/// - Any field has an unsupported type
#[proc_macro_derive(Species, attributes(species, mask, identifier))]
pub fn derive_species(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let gpu_name = Ident::new(&format!("{}Gpu", name), Span::call_site());

    let attrs = match SpeciesAttrs::parse(&input) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("Species derive only supports structs with named fields"),
        },
        _ => panic!("Species derive only supports structs"),
    };

    let mut layout = GpuLayout::default();
    let mut to_gpu_conversions = Vec::new();
    let mut from_gpu_conversions = Vec::new();
    let mut mask_field: Option<Ident> = None;
    let mut custom_identifiers = Vec::new();

    for field in fields.iter() {
        let field_name = field.ident.as_ref().expect("named field");
        let field_name_str = field_name.to_string();
        let field_type = &field.ty;
        let type_info = rust_type_info(field_type);

        for attr in &field.attrs {
            if attr.path().is_ident("mask") {
                if type_info.wgsl_type != "u32" {
                    panic!("#[mask] field '{}' must be u32", field_name_str);
                }
                mask_field = Some(field_name.clone());
            } else if attr.path().is_ident("identifier") {
                match attr.parse_args::<syn::Path>() {
                    Ok(path) => custom_identifiers.push((path, field_name.clone())),
                    Err(e) => return e.to_compile_error().into(),
                }
            }
        }

        to_gpu_conversions.extend(layout.align_to(type_info.align));

        layout.push_field(&field_name_str, &type_info);

        let conversion = generate_conversion(field_name, field_type);
        to_gpu_conversions.push(quote! { #field_name: #conversion });

        let reverse_conversion = generate_reverse_conversion(field_name, field_type);
        from_gpu_conversions.push(quote! { #field_name: #reverse_conversion });
    }

    require_field(fields, "local_cell_idx", "u32");
    require_field(fields, "weighting", "f32");

    // Ensure struct size is multiple of 16 (vec4 alignment for GPU arrays)
    to_gpu_conversions.extend(layout.align_to(16));

    let wgsl_struct = format!("struct Particle {{\n{}\n}}", layout.wgsl_fields.join("\n"));
    let gpu_struct_fields = &layout.gpu_struct_fields;

    let identifier_impls = BUILTIN_IDENTIFIERS.iter().map(|(field, identifier)| {
        let identifier = Ident::new(identifier, Span::call_site());
        let bound = fields
            .iter()
            .find(|f| f.ident.as_ref().map(|i| i == field).unwrap_or(false));
        match bound {
            Some(f) => {
                let field_name = f.ident.as_ref().expect("named field");
                quote! {
                    impl supercell::identifier::HasIdentifier<supercell::identifier::#identifier> for #name {
                        type Flag = supercell::identifier::Present;
                    }

                    impl supercell::identifier::Get<supercell::identifier::#identifier> for #name {
                        #[inline(always)]
                        fn get(&self) -> <supercell::identifier::#identifier as supercell::identifier::Identifier>::Value {
                            self.#field_name
                        }
                    }
                }
            }
            None => quote! {
                impl supercell::identifier::HasIdentifier<supercell::identifier::#identifier> for #name {
                    type Flag = supercell::identifier::Absent;
                }
            },
        }
    });

    let custom_identifier_impls = custom_identifiers.iter().map(|(path, field_name)| {
        quote! {
            impl supercell::identifier::HasIdentifier<#path> for #name {
                type Flag = supercell::identifier::Present;
            }

            impl supercell::identifier::Get<#path> for #name {
                #[inline(always)]
                fn get(&self) -> <#path as supercell::identifier::Identifier>::Value {
                    self.#field_name
                }
            }
        }
    });

    let (is_valid_body, mask_field_expr) = match &mask_field {
        Some(field) => {
            let field_str = field.to_string();
            (quote! { self.#field != 0 }, quote! { Some(#field_str) })
        }
        None => (quote! { true }, quote! { None }),
    };

    let (cell_type, super_cell_size) = attrs.cell_type();
    let species_name = attrs.name.unwrap_or_else(|| name.to_string());
    let charge = attrs.charge;
    let mass = attrs.mass;

    let expanded = quote! {
        #[repr(C)]
        #[derive(Clone, Copy, Debug, supercell::bytemuck::Pod, supercell::bytemuck::Zeroable)]
        #[bytemuck(crate = "supercell::bytemuck")]
        pub struct #gpu_name {
            #(pub #gpu_struct_fields),*
        }

        impl supercell::Species for #name {
            type Cell = #cell_type;
            type Gpu = #gpu_name;

            const NAME: &'static str = #species_name;
            const SUPER_CELL_SIZE: Self::Cell = #super_cell_size;
            const CHARGE: f32 = (#charge) as f32;
            const MASS: f32 = (#mass) as f32;
            const WGSL_STRUCT: &'static str = #wgsl_struct;
            const MASK_FIELD: Option<&'static str> = #mask_field_expr;

            #[inline(always)]
            fn is_valid(&self) -> bool {
                #is_valid_body
            }

            #[inline(always)]
            fn set_local_cell_idx(&mut self, idx: u32) {
                self.local_cell_idx = idx;
            }

            fn to_gpu(&self) -> Self::Gpu {
                #gpu_name {
                    #(#to_gpu_conversions),*
                }
            }

            fn from_gpu(gpu: &Self::Gpu) -> Self {
                Self {
                    #(#from_gpu_conversions),*
                }
            }
        }

        #(#identifier_impls)*

        #(#custom_identifier_impls)*
    };

    TokenStream::from(expanded)
}

/// Contents of `#[species(...)]`.
struct SpeciesAttrs {
    name: Option<String>,
    super_cell: Vec<Expr>,
    charge: Expr,
    mass: Expr,
}

impl SpeciesAttrs {
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let mut name = None;
        let mut super_cell = None;
        let mut charge = None;
        let mut mass = None;

        let attr = input
            .attrs
            .iter()
            .find(|a| a.path().is_ident("species"))
            .unwrap_or_else(|| panic!("Species derive requires a #[species(super_cell = [..], charge = ..)] attribute"));

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("super_cell") {
                let array: ExprArray = meta.value()?.parse()?;
                if array.elems.is_empty() || array.elems.len() > 3 {
                    return Err(meta.error("super_cell must have 1, 2 or 3 extents"));
                }
                if let Some(extent) = array.elems.iter().find(|e| literal_extent(e).is_some_and(|v| v <= 0)) {
                    return Err(syn::Error::new_spanned(extent, "super_cell extents must be positive"));
                }
                super_cell = Some(array.elems.into_iter().collect());
                Ok(())
            } else if meta.path.is_ident("charge") {
                charge = Some(meta.value()?.parse::<Expr>()?);
                Ok(())
            } else if meta.path.is_ident("mass") {
                mass = Some(meta.value()?.parse::<Expr>()?);
                Ok(())
            } else if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported species key, expected super_cell, charge, mass or name"))
            }
        })?;

        let super_cell = super_cell.unwrap_or_else(|| panic!("#[species] requires super_cell = [..]"));
        let charge = charge.unwrap_or_else(|| panic!("#[species] requires charge = .."));
        let mass = mass.unwrap_or_else(|| syn::parse_quote!(1.0));

        Ok(Self { name, super_cell, charge, mass })
    }

    /// Cell type and supercell size expression for the declared dimension.
    fn cell_type(&self) -> (proc_macro2::TokenStream, proc_macro2::TokenStream) {
        let e = &self.super_cell;
        match e.len() {
            1 => {
                let x = &e[0];
                (quote! { i32 }, quote! { (#x) as i32 })
            }
            2 => {
                let (x, y) = (&e[0], &e[1]);
                (
                    quote! { supercell::glam::IVec2 },
                    quote! { supercell::glam::IVec2::new((#x) as i32, (#y) as i32) },
                )
            }
            _ => {
                let (x, y, z) = (&e[0], &e[1], &e[2]);
                (
                    quote! { supercell::glam::IVec3 },
                    quote! { supercell::glam::IVec3::new((#x) as i32, (#y) as i32, (#z) as i32) },
                )
            }
        }
    }
}

/// Value of an integer literal extent such as `4` or `-1`; `None` for other expressions.
fn literal_extent(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Lit(syn::ExprLit { lit: syn::Lit::Int(int), .. }) => int.base10_parse().ok(),
        Expr::Unary(syn::ExprUnary { op: syn::UnOp::Neg(_), expr, .. }) => literal_extent(expr).map(|v| -v),
        Expr::Paren(syn::ExprParen { expr, .. }) => literal_extent(expr),
        _ => None,
    }
}

/// Panics unless the struct has `name: ty`.
fn require_field(fields: &syn::punctuated::Punctuated<syn::Field, syn::Token![,]>, name: &str, ty: &str) {
    let field = fields
        .iter()
        .find(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
        .unwrap_or_else(|| panic!("Species derive requires a field `{}: {}`", name, ty));
    let field_ty = &field.ty;
    let type_str = quote!(#field_ty).to_string().replace(' ', "");
    if type_str != ty {
        panic!("Species field `{}` must be {}, found {}", name, ty, type_str);
    }
}

/// Running GPU struct layout.
#[derive(Default)]
struct GpuLayout {
    wgsl_fields: Vec<String>,
    gpu_struct_fields: Vec<proc_macro2::TokenStream>,
    offset: u32,
    padding_count: u32,
}

impl GpuLayout {
    /// Insert padding so the next field starts at a multiple of `align`.
    ///
    /// Returns the `to_gpu` initializers for the inserted padding.
    fn align_to(&mut self, align: u32) -> Option<proc_macro2::TokenStream> {
        let padding_needed = (align - (self.offset % align)) % align;
        if padding_needed == 0 {
            return None;
        }

        let pad_name = Ident::new(&format!("_pad{}", self.padding_count), Span::call_site());
        let pad_name_str = format!("_pad{}", self.padding_count);
        self.padding_count += 1;
        self.offset += padding_needed;

        if padding_needed == 4 {
            self.wgsl_fields.push(format!("    {}: f32,", pad_name_str));
            self.gpu_struct_fields.push(quote! { #pad_name: f32 });
            Some(quote! { #pad_name: 0.0 })
        } else {
            let count = (padding_needed / 4) as usize;
            self.wgsl_fields.push(format!("    {}: array<f32, {}>,", pad_name_str, count));
            self.gpu_struct_fields.push(quote! { #pad_name: [f32; #count] });
            Some(quote! { #pad_name: [0.0; #count] })
        }
    }

    fn push_field(&mut self, name: &str, type_info: &TypeInfo) {
        let field_name = Ident::new(name, Span::call_site());
        let gpu_type = &type_info.gpu_type;
        self.wgsl_fields.push(format!("    {}: {},", name, type_info.wgsl_type));
        self.gpu_struct_fields.push(quote! { #field_name: #gpu_type });
        self.offset += type_info.size;
    }
}

/// Type metadata for GPU memory layout calculations.
struct TypeInfo {
    /// WGSL type name (e.g., "vec3<f32>")
    wgsl_type: &'static str,
    /// Rust type for the GPU struct (e.g., `[f32; 3]`)
    gpu_type: proc_macro2::TokenStream,
    /// Size in bytes
    size: u32,
    /// Required alignment in bytes
    align: u32,
}

/// Get type information for a Rust type.
///
/// Maps Rust types to their WGSL equivalents and alignment requirements.
fn rust_type_info(ty: &Type) -> TypeInfo {
    let type_str = quote!(#ty).to_string().replace(' ', "");

    match type_str.as_str() {
        "Vec3" | "glam::Vec3" | "supercell::glam::Vec3" => TypeInfo {
            wgsl_type: "vec3<f32>",
            gpu_type: quote! { [f32; 3] },
            size: 12,
            align: 16, // vec3 has 16-byte alignment in WGSL!
        },
        "Vec2" | "glam::Vec2" | "supercell::glam::Vec2" => TypeInfo {
            wgsl_type: "vec2<f32>",
            gpu_type: quote! { [f32; 2] },
            size: 8,
            align: 8,
        },
        "Vec4" | "glam::Vec4" | "supercell::glam::Vec4" => TypeInfo {
            wgsl_type: "vec4<f32>",
            gpu_type: quote! { [f32; 4] },
            size: 16,
            align: 16,
        },
        "f32" => TypeInfo {
            wgsl_type: "f32",
            gpu_type: quote! { f32 },
            size: 4,
            align: 4,
        },
        "u32" => TypeInfo {
            wgsl_type: "u32",
            gpu_type: quote! { u32 },
            size: 4,
            align: 4,
        },
        "i32" => TypeInfo {
            wgsl_type: "i32",
            gpu_type: quote! { i32 },
            size: 4,
            align: 4,
        },
        _ => panic!("Unsupported type in Species struct: {}", type_str),
    }
}

fn is_vector(ty: &Type) -> Option<&'static str> {
    let type_str = quote!(#ty).to_string().replace(' ', "");
    match type_str.rsplit("::").next() {
        Some("Vec2") => Some("Vec2"),
        Some("Vec3") => Some("Vec3"),
        Some("Vec4") => Some("Vec4"),
        _ => None,
    }
}

/// Generate code to convert a field from Rust to GPU format.
///
/// Vector types need `.to_array()`, scalars are passed through.
fn generate_conversion(field_name: &Ident, ty: &Type) -> proc_macro2::TokenStream {
    match is_vector(ty) {
        Some(_) => quote! { self.#field_name.to_array() },
        None => quote! { self.#field_name },
    }
}

/// Generate code to convert a field from GPU format back to Rust.
///
/// Vector types need `from_array()`, scalars are passed through.
fn generate_reverse_conversion(field_name: &Ident, ty: &Type) -> proc_macro2::TokenStream {
    match is_vector(ty) {
        Some(vector) => {
            let vector = Ident::new(vector, Span::call_site());
            quote! { supercell::glam::#vector::from_array(gpu.#field_name) }
        }
        None => quote! { gpu.#field_name },
    }
}
