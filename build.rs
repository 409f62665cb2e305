//! Build script for jwekit.
//!
//! This emits compile-time warnings for security-sensitive feature flags.

fn main() {
    // Emit a compile-time warning when the rsa1_5 feature is enabled
    #[cfg(feature = "rsa1_5")]
    {
        // Note: Using single-colon syntax for MSRV 1.75.0 compatibility
        println!("cargo:warning=SECURITY WARNING: The 'rsa1_5' feature is enabled.");
        println!("cargo:warning=RSA1_5 key encryption is exposed to padding-oracle attacks (Bleichenbacher) and the `rsa` crate is affected by RUSTSEC-2023-0071 (Marvin Attack).");
        println!("cargo:warning=Use RSA-OAEP-256 or ECDH-ES for new deployments. RSA1_5 is provided only for interoperability with legacy producers.");
    }
}
