use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Pat};

/// Time a simulation system when the `perf_stats` feature is enabled.
///
/// The function body is wrapped with a drop guard that reports the elapsed
/// time through Bevy's `info!`. Without the feature the attribute expands to
/// the unchanged function.
///
/// A parameter named `tick` whose type mentions `SimTick` is picked up
/// automatically; the report then carries the tick number and is also
/// emitted every 100 ticks regardless of the threshold.
///
/// ```ignore
/// #[profile]
/// pub fn apply_push(mut objects: LevelObjects, tick: Res<SimTick>) { ... }
///
/// #[profile(250)] // threshold in microseconds
/// pub fn publish_contacts(...) { ... }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_us: u128 = if attr.is_empty() {
        1000
    } else {
        attr.to_string().trim().parse().unwrap_or(1000)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let has_tick_param = sig.inputs.iter().any(|arg| match arg {
        FnArg::Typed(pat_type) => match &*pat_type.pat {
            Pat::Ident(pat_ident) if pat_ident.ident == "tick" => {
                let ty = &pat_type.ty;
                quote!(#ty).to_string().contains("SimTick")
            }
            _ => false,
        },
        FnArg::Receiver(_) => false,
    });

    let tick_expr = if has_tick_param {
        quote! { Some(tick.0) }
    } else {
        quote! { None }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                struct ProfileGuard {
                    name: &'static str,
                    start: std::time::Instant,
                    tick: Option<u64>,
                }
                impl Drop for ProfileGuard {
                    fn drop(&mut self) {
                        let elapsed = self.start.elapsed();
                        let periodic = self.tick.map_or(false, |t| t % 100 == 0);
                        if elapsed.as_micros() > #threshold_us || periodic {
                            match self.tick {
                                Some(t) => bevy::prelude::info!("[PERF] tick {} {}: {:?}", t, self.name, elapsed),
                                None => bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed),
                            }
                        }
                    }
                }
                ProfileGuard {
                    name: #fn_name_str,
                    start: std::time::Instant::now(),
                    tick: #tick_expr,
                }
            };

            #block
        }
    };

    output.into()
}
