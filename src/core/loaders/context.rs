/// Everything a loader needs to merge itself into a base descriptor.
pub struct InstallContext<'a> {
    pub minecraft_version: &'a str,
    pub loader_version: Option<&'a str>,
    /// Base of the loader metadata API.
    pub meta_url: &'a str,
    /// Repository the loader's own coordinates are fetched from.
    pub maven_url: &'a str,
}
