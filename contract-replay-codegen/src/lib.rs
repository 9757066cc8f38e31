use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use quote::quote_spanned;
use std::path::Path;
use syn::spanned::Spanned;

/// Replays a transcript fixture against a contract fixture as a `#[test]`.
///
/// `#[contract_replay_test("requests.json", "openapi.yaml")]` on a function
/// without arguments asserts that every entry was valid. A function taking one
/// `RunSummary` argument receives the tally instead. An optional third argument
/// names a `fn(&mut ReplayConfiguration)`.
#[proc_macro_attribute]
pub fn contract_replay_test(attrs: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemFn);
    let args = syn::parse_macro_input!(attrs as syn::AttributeArgs);

    let signature = &input.sig;
    let name = &signature.ident;
    let inputs = &signature.inputs;
    let block = &input.block;

    if args.len() < 2 || args.len() > 3 {
        return quote! {
            compile_error!("A transcript path, a contract path and an optional configuration function should be passed to the macro");
        }
        .into();
    }

    let transcript_path = match &args[0] {
        syn::NestedMeta::Lit(syn::Lit::Str(path)) => path,
        _ => {
            return quote! {
                compile_error!("The first argument should be a string literal!");
            }
            .into()
        }
    };
    if let Err(stream) = validate_path(&transcript_path.value(), &["json"], transcript_path.span()) {
        return stream.into();
    }

    let contract_path = match &args[1] {
        syn::NestedMeta::Lit(syn::Lit::Str(path)) => path,
        _ => {
            return quote! {
                compile_error!("The second argument should be a string literal!");
            }
            .into()
        }
    };
    if let Err(stream) = validate_path(
        &contract_path.value(),
        &["yaml", "yml", "json"],
        contract_path.span(),
    ) {
        return stream.into();
    }

    let configure = match args.get(2) {
        Some(syn::NestedMeta::Meta(syn::Meta::Path(function_path))) => {
            quote! { #function_path(&mut __replay_configuration); }
        }
        Some(_) => {
            return quote! {
                compile_error!("The third argument should be a configuration function!");
            }
            .into()
        }
        None => quote! {},
    };

    let check = match inputs.len() {
        0 => quote! {
            assert!(
                __replay_summary.is_clean(),
                "Contract replay was not clean: {}",
                __replay_summary
            );
            #block
        },
        1 => quote! {
            (|#inputs| #block)(__replay_summary)
        },
        _ => {
            let span = inputs.span();
            return quote_spanned! {span=>
                compile_error!("The test function should take no arguments or a single RunSummary");
            }
            .into();
        }
    };

    let transcript_path = transcript_path.value();
    let contract_path = contract_path.value();

    let output = quote! {
        #[test]
        fn #name() {
            #[allow(unused_mut)]
            let mut __replay_configuration = contract_replay::ReplayConfiguration::new();
            #configure

            let __replay_summary = match contract_replay::replay_files(
                concat!(env!("CARGO_MANIFEST_DIR"), "/", #transcript_path),
                concat!(env!("CARGO_MANIFEST_DIR"), "/", #contract_path),
                &__replay_configuration,
                &mut contract_replay::TracingSink::new(),
            ) {
                Ok(summary) => summary,
                Err(e) => panic!("Contract replay error: {}", e),
            };

            #check
        }
    };

    TokenStream::from(output)
}

fn validate_path<P: AsRef<Path>>(
    path: P,
    extensions: &[&str],
    span: Span,
) -> Result<(), proc_macro2::TokenStream> {
    let matches = path
        .as_ref()
        .extension()
        .and_then(|extension| extension.to_str())
        .map_or(false, |extension| extensions.contains(&extension));

    if !matches {
        let message = format!(
            "The path should point to a {} file!",
            extensions
                .iter()
                .map(|extension| format!(".{}", extension))
                .collect::<Vec<_>>()
                .join(" or ")
        );
        return Err(quote_spanned! {span=>
            compile_error!(#message);
        });
    }

    Ok(())
}
