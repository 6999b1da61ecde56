use proc_macro::TokenStream;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;

/// Runs the annotated function as a test against a fresh mock provider session.
///
/// The single argument is a function taking `&mut pact_mock::MockProviderConfiguration`. The
/// test function receives `&pact_mock::MockProvider` and returns `()` or a `Result`. After the
/// body returns, the session is verified and its contract written; a verification failure fails
/// the test. A body that panics or returns `Err` fails the test without writing a contract. The
/// session is finalized in every case.
#[proc_macro_attribute]
pub fn pact_consumer_test(attrs: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemFn);
    let args = syn::parse_macro_input!(attrs as syn::AttributeArgs);

    if args.len() != 1 {
        return quote! {
            compile_error!("A configuration function should be passed to the macro");
        }
        .into();
    }

    let configuration_function =
        if let syn::NestedMeta::Meta(syn::Meta::Path(function_path)) = &args[0] {
            function_path
        } else {
            return quote_spanned! {args[0].span()=>
                compile_error!("The argument should be a configuration function!");
            }
            .into();
        };

    let signature = &input.sig;
    if signature.inputs.len() != 1 {
        return quote_spanned! {signature.inputs.span()=>
            compile_error!(
                "The test function should take a single `&pact_mock::MockProvider` argument!"
            );
        }
        .into();
    }

    let attributes = &input.attrs;
    let visibility = &input.vis;
    let name = &signature.ident;
    let inputs = &signature.inputs;
    let return_type = &signature.output;
    let block = &input.block;

    let output = quote! {
        #(#attributes)*
        #[test]
        #visibility fn #name() {
            fn __pact_test_body(#inputs) #return_type #block

            let mut __pact_configuration = pact_mock::MockProviderConfiguration::default();
            #configuration_function(&mut __pact_configuration);

            let mut __pact_provider = pact_mock::MockProvider::new(__pact_configuration);
            if let Err(e) = __pact_provider.setup() {
                panic!("Pact Error: {}", e);
            }

            let __pact_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                pact_mock::TestOutcome::into_result(__pact_test_body(&__pact_provider))
            }));

            match __pact_result {
                Ok(Ok(())) => {}
                Ok(Err(message)) => {
                    let _ = __pact_provider.finalize();
                    panic!("Pact Error: the test returned {}", message);
                }
                Err(e) => {
                    let _ = __pact_provider.finalize();
                    std::panic::resume_unwind(e);
                }
            }
            if let Err(e) = __pact_provider.finish() {
                panic!("Pact Error: {}", e);
            }
        }
    };

    TokenStream::from(output)
}
